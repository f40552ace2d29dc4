//! Edge case tests for p4c-ast's parser.

#[cfg(test)]
mod tests {
    use crate::ast::NodeKind;
    use crate::{parse, Ast};
    use p4c_util::Handler;

    fn parse_source(source: &str) -> (Ast, Handler) {
        let mut handler = Handler::new();
        let ast = parse(source, &mut handler);
        (ast, handler)
    }

    fn root_decls<'a>(ast: &'a Ast) -> &'a [crate::ast::NodeId] {
        let root = ast.root.expect("program has a root");
        let NodeKind::Program { decls } = ast.kind(root) else {
            panic!("root is not a Program node");
        };
        let NodeKind::DeclarationList { decls } = ast.kind(*decls) else {
            panic!("Program.decls is not a DeclarationList");
        };
        decls
    }

    #[test]
    fn empty_source_parses_to_an_empty_declaration_list() {
        let (ast, handler) = parse_source("");
        assert!(!handler.has_errors());
        assert!(root_decls(&ast).is_empty());
    }

    #[test]
    fn whitespace_and_comments_only() {
        let (ast, handler) = parse_source("// nothing here\n/* also nothing */\n   \n");
        assert!(!handler.has_errors());
        assert!(root_decls(&ast).is_empty());
    }

    #[test]
    fn header_type_declaration() {
        let (ast, handler) = parse_source(
            "header Ethernet { bit<48> dst; bit<48> src; bit<16> etherType; }",
        );
        assert!(!handler.has_errors());
        let decls = root_decls(&ast);
        assert_eq!(decls.len(), 1);
        let NodeKind::HeaderTypeDecl { fields, .. } = ast.kind(decls[0]) else {
            panic!("expected HeaderTypeDecl");
        };
        let NodeKind::StructFieldList { fields } = ast.kind(*fields) else {
            panic!("expected StructFieldList");
        };
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn struct_of_headers() {
        let (ast, handler) = parse_source(
            "struct Headers { Ethernet ethernet; Ipv4 ipv4; }",
        );
        assert!(!handler.has_errors());
        let decls = root_decls(&ast);
        assert!(matches!(ast.kind(decls[0]), NodeKind::StructTypeDecl { .. }));
    }

    #[test]
    fn typedef_flattens_to_its_target_syntactically() {
        let (ast, handler) = parse_source("typedef bit<32> Word;");
        assert!(!handler.has_errors());
        let decls = root_decls(&ast);
        assert!(matches!(ast.kind(decls[0]), NodeKind::TypedefDecl { .. }));
    }

    #[test]
    fn enum_with_explicit_values() {
        let (ast, handler) = parse_source(
            "enum bit<8> Color { Red = 1, Green = 2, Blue = 4 }",
        );
        assert!(!handler.has_errors());
        let decls = root_decls(&ast);
        let NodeKind::EnumDecl { type_size, fields, .. } = ast.kind(decls[0]) else {
            panic!("expected EnumDecl");
        };
        assert!(type_size.is_some());
        assert!(matches!(ast.kind(*fields), NodeKind::SpecifiedIdentifierList { .. }));
    }

    #[test]
    fn action_with_table_apply() {
        let source = r#"
            action drop() { mark_to_drop(); }
            table t {
                key = { hdr.ipv4.dstAddr: exact; }
                actions = { drop; NoAction; }
            }
        "#;
        let (ast, handler) = parse_source(source);
        assert!(!handler.has_errors());
        let decls = root_decls(&ast);
        assert_eq!(decls.len(), 2);
        assert!(matches!(ast.kind(decls[0]), NodeKind::ActionDecl { .. }));
        let NodeKind::TableDecl { prop_list, .. } = ast.kind(decls[1]) else {
            panic!("expected TableDecl");
        };
        let NodeKind::TablePropertyList { props } = ast.kind(*prop_list) else {
            panic!("expected TablePropertyList");
        };
        assert_eq!(props.len(), 2);
        assert!(matches!(ast.kind(props[0]), NodeKind::KeyProperty { .. }));
        assert!(matches!(ast.kind(props[1]), NodeKind::ActionsProperty { .. }));
    }

    #[test]
    fn parser_with_select_and_header_stack_subscript() {
        let source = r#"
            parser P(packet_in pkt, out Headers hdr) {
                state start {
                    pkt.extract(hdr.stack[0]);
                    transition select(hdr.stack[0].nextProto) {
                        8w0: parseIp;
                        default: accept;
                    }
                }
                state parseIp {
                    transition accept;
                }
            }
        "#;
        let (ast, handler) = parse_source(source);
        assert!(!handler.has_errors());
        let decls = root_decls(&ast);
        assert_eq!(decls.len(), 1);
        let NodeKind::ParserDecl { states, .. } = ast.kind(decls[0]) else {
            panic!("expected ParserDecl");
        };
        let NodeKind::ParserStates { states } = ast.kind(*states) else {
            panic!("expected ParserStates");
        };
        assert_eq!(states.len(), 2);
    }

    #[test]
    fn control_with_if_and_direct_application() {
        let source = r#"
            control C(inout Headers hdr) {
                T t;
                apply {
                    if (hdr.ipv4.isValid()) {
                        t.apply();
                    } else {
                        mark_to_drop();
                    }
                }
            }
        "#;
        let (ast, handler) = parse_source(source);
        assert!(!handler.has_errors());
        let decls = root_decls(&ast);
        let NodeKind::ControlDecl { local_decls, apply_stmt, .. } = ast.kind(decls[0]) else {
            panic!("expected ControlDecl");
        };
        let NodeKind::ControlLocalDeclarations { decls: locals } = ast.kind(*local_decls) else {
            panic!("expected ControlLocalDeclarations");
        };
        assert_eq!(locals.len(), 1);
        assert!(matches!(ast.kind(*apply_stmt), NodeKind::BlockStatement { .. }));
    }

    #[test]
    fn cast_expression_to_base_type() {
        let (ast, handler) = parse_source(
            "control C() { bit<8> x; apply { x = (bit<8>)(9w0 + 1); } }",
        );
        assert!(!handler.has_errors());
        let decls = root_decls(&ast);
        assert!(matches!(ast.kind(decls[0]), NodeKind::ControlDecl { .. }));
    }

    #[test]
    fn package_and_instantiation() {
        let source = r#"
            package Switch(P p, C c);
            Switch(MyParser(), MyControl()) main;
        "#;
        let (ast, handler) = parse_source(source);
        assert!(!handler.has_errors());
        let decls = root_decls(&ast);
        assert_eq!(decls.len(), 2);
        assert!(matches!(ast.kind(decls[0]), NodeKind::PackageTypeDecl { .. }));
        assert!(matches!(ast.kind(decls[1]), NodeKind::Instantiation { .. }));
    }

    #[test]
    fn extern_object_with_constructor_and_method() {
        let source = r#"
            extern Checksum {
                Checksum();
                void update(in bit<16> data);
                bit<16> get();
            }
        "#;
        let (ast, handler) = parse_source(source);
        assert!(!handler.has_errors());
        let decls = root_decls(&ast);
        let NodeKind::ExternDecl { decl } = ast.kind(decls[0]) else {
            panic!("expected ExternDecl");
        };
        let NodeKind::ExternTypeDecl { method_protos, .. } = ast.kind(*decl) else {
            panic!("expected ExternTypeDecl");
        };
        let NodeKind::MethodPrototypes { protos } = ast.kind(*method_protos) else {
            panic!("expected MethodPrototypes");
        };
        assert_eq!(protos.len(), 3);
        let NodeKind::FunctionPrototype { return_type, .. } = ast.kind(protos[0]) else {
            panic!("expected FunctionPrototype");
        };
        assert!(return_type.is_none(), "constructor prototype has no return type");
    }

    #[test]
    fn malformed_declaration_reports_error_and_resynchronizes() {
        let source = "header { bit<8> x; } header H2 { bit<8> y; }";
        let (ast, handler) = parse_source(source);
        assert!(handler.has_errors());
        let decls = root_decls(&ast);
        assert!(decls.iter().any(|&d| matches!(ast.kind(d), NodeKind::HeaderTypeDecl { .. })));
    }

    #[test]
    fn error_and_match_kind_declarations() {
        let (ast, handler) = parse_source(
            "error { NoError, PacketTooShort } match_kind { exact, ternary, lpm }",
        );
        assert!(!handler.has_errors());
        let decls = root_decls(&ast);
        assert_eq!(decls.len(), 2);
        assert!(matches!(ast.kind(decls[0]), NodeKind::ErrorDecl { .. }));
        assert!(matches!(ast.kind(decls[1]), NodeKind::MatchKindDecl { .. }));
    }

    #[test]
    fn tuple_type_in_typedef() {
        let (ast, handler) = parse_source("typedef tuple<bit<8>, bit<8>> Pair;");
        assert!(!handler.has_errors());
        let decls = root_decls(&ast);
        let NodeKind::TypedefDecl { type_ref, .. } = ast.kind(decls[0]) else {
            panic!("expected TypedefDecl");
        };
        let NodeKind::TypeRef { ty } = ast.kind(*type_ref) else {
            panic!("expected TypeRef");
        };
        assert!(matches!(ast.kind(*ty), NodeKind::TupleType { .. }));
    }
}
