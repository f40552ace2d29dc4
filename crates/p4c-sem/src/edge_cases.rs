//! Edge and error case tests for p4c-sem, run end to end against real P4
//! fragments rather than against individual pass internals.

#[cfg(test)]
mod tests {
    use p4c_util::Handler;

    use crate::scope::Namespace;
    use crate::types::TypeKind;

    fn analyze_src(src: &str) -> (crate::ScopeTree, crate::types::TypeUniverse, crate::SemaTables, Handler, crate::PotentialTypeMap) {
        let mut parse_handler = Handler::new();
        let ast = p4c_ast::parse(src, &mut parse_handler);
        assert!(!parse_handler.has_errors(), "fixture failed to parse: {src}");
        let handler = Handler::new();
        let (scope, types, tables, potential) = crate::analysis::analyze(&ast, &handler);
        (scope, types, tables, handler, potential)
    }

    // ==================== SCOPE TREE EDGE CASES ====================

    /// EDGE CASE: an empty program has nothing to resolve, and the root
    /// scope's preloaded keywords/base types still stand alone.
    #[test]
    fn test_edge_empty_program() {
        let (scope, _types, _tables, handler, _potential) = analyze_src("");
        assert!(!handler.has_errors());
        assert!(scope.lookup_builtin(Namespace::Type, p4c_util::Symbol::intern("bit")).is_some());
    }

    /// EDGE CASE: a parameter shadows an outer const of the same spelling
    /// inside its own action body; the outer binding survives at the
    /// program scope.
    #[test]
    fn test_edge_param_shadows_outer_const() {
        let src = r#"
            const bit<8> x = 8w1;
            action a(bit<8> x) { }
        "#;
        let (_scope, _types, _tables, handler, _potential) = analyze_src(src);
        assert!(!handler.has_errors());
    }

    /// EDGE CASE: an extern with two constructors of different arity forms
    /// an overload chain rather than one clobbering the other.
    #[test]
    fn test_edge_ctor_overload_chain() {
        let src = r#"
            extern E {
                E();
                E(bit<8> a);
                void run();
            }
        "#;
        let (scope, types, _tables, handler, _potential) = analyze_src(src);
        assert!(!handler.has_errors());
        let e_ty = types
            .ids()
            .find(|&id| matches!(types.kind(id), TypeKind::Extern { name, .. } if name.as_str() == "E"))
            .expect("extern type allocated");
        let TypeKind::Extern { ctors, .. } = types.kind(e_ty) else { unreachable!() };
        assert_eq!(ctors.len(), 2);
        let def = scope.lookup(scope.root, Namespace::Type, p4c_util::Symbol::intern("E")).unwrap();
        assert_eq!(scope.overload_set(def).len(), 1, "the type name itself binds once");
    }

    // ==================== DECLARED TYPE ERROR CASES ====================

    /// ERROR CASE: a typedef chain that refers back to itself across two
    /// names never terminates and is reported rather than looping forever.
    #[test]
    fn test_error_typedef_cycle() {
        let src = "typedef B A; typedef A B;";
        let (_scope, _types, _tables, handler, _potential) = analyze_src(src);
        assert!(handler.has_errors());
    }

    /// ERROR CASE: referencing a type name that is never declared anywhere
    /// reports an unresolved-reference diagnostic rather than panicking on
    /// a missing scope entry.
    #[test]
    fn test_error_unresolved_type_in_struct_field() {
        let src = "struct S { DoesNotExist f; }";
        let (_scope, _types, _tables, handler, _potential) = analyze_src(src);
        assert!(handler.has_errors());
    }

    /// EDGE CASE: a header stack of a previously-declared header type
    /// builds without needing the element type to be resolved twice.
    #[test]
    fn test_edge_header_stack_element_type() {
        let src = r#"
            header H { bit<8> f; }
            struct S { H[4] stack; }
        "#;
        let (_scope, types, _tables, handler, _potential) = analyze_src(src);
        assert!(!handler.has_errors());
        let stack_ty = types
            .ids()
            .find(|&id| matches!(types.kind(id), TypeKind::Struct { .. }))
            .and_then(|id| match types.kind(id) {
                TypeKind::Struct { fields, .. } => fields.first().map(|f| f.ty),
                _ => None,
            })
            .expect("struct field present");
        assert!(matches!(types.kind(stack_ty), TypeKind::HeaderStack { size: 4, .. }));
    }

    // ==================== TYPE UNIVERSE EDGE CASES ====================

    /// EDGE CASE: mutually recursive struct-shaped types (each holding the
    /// other as a field) are equivalent to themselves without the
    /// coinductive `seen` stack recursing forever.
    #[test]
    fn test_edge_mutually_recursive_structs_terminate() {
        use crate::types::{Field, TypeUniverse};
        use p4c_util::Symbol;

        let mut u = TypeUniverse::new();
        let bit8 = u.bit(Some(8));
        let a_id = u.alloc(TypeKind::TypeError); // placeholder, patched below
        let b = u.alloc(TypeKind::Struct {
            name: Symbol::intern("B"),
            fields: vec![Field { name: Symbol::intern("a"), ty: a_id }],
        });
        u.set_kind(
            a_id,
            TypeKind::Struct { name: Symbol::intern("A"), fields: vec![Field { name: Symbol::intern("b"), ty: b }] },
        );
        assert!(u.equivalent(a_id, a_id));
        assert!(!u.equivalent(a_id, bit8));
    }

    /// EDGE CASE: `Any` absorbs every other type in equivalence, including
    /// another `Any` and the recovery `TypeError` sentinel.
    #[test]
    fn test_edge_any_absorbs_everything() {
        use crate::types::TypeUniverse;

        let mut u = TypeUniverse::new();
        let bit16 = u.bit(Some(16));
        let err = u.alloc(TypeKind::TypeError);
        assert!(u.equivalent(u.any(), bit16));
        assert!(u.equivalent(u.any(), err));
        assert!(u.equivalent(u.any(), u.any()));
    }

    /// EDGE CASE: a typedef chain within the allowed bound still flattens
    /// to its terminal type rather than reporting a spurious cycle.
    #[test]
    fn test_edge_long_typedef_chain_flattens() {
        let mut src = String::from("typedef bit<8> T0;");
        for i in 1..50 {
            src.push_str(&format!("typedef T{} T{};", i - 1, i));
        }
        let (_scope, types, _tables, handler, _potential) = analyze_src(&src);
        assert!(!handler.has_errors());
        let last = types
            .ids()
            .find(|&id| matches!(types.kind(id), TypeKind::Alias(inner) if matches!(types.kind(*inner), TypeKind::Bit(Some(8)))));
        assert!(last.is_some());
    }

    // ==================== POTENTIAL / SELECT TYPE EDGE CASES ====================

    /// EDGE CASE: an integer literal whose declared width matches its
    /// assignment target selects down to that one candidate.
    #[test]
    fn test_edge_sized_literal_selects_cleanly() {
        let src = r#"
            control C() {
                apply {
                    bit<8> x;
                    x = 8w1;
                }
            }
        "#;
        let (_scope, _types, _tables, handler, _potential) = analyze_src(src);
        assert!(!handler.has_errors());
    }

    /// ERROR CASE: an integer literal whose own declared width disagrees
    /// with its assignment target has no candidate equivalent to the
    /// required type, so selection reports a mismatch rather than silently
    /// truncating or widening.
    #[test]
    fn test_error_mismatched_literal_width_on_assignment() {
        let src = r#"
            control C() {
                apply {
                    bit<8> x;
                    x = 16w1;
                }
            }
        "#;
        let (_scope, _types, _tables, handler, _potential) = analyze_src(src);
        assert!(handler.has_errors());
    }

    /// ERROR CASE: calling a zero-argument overloaded extern method in a
    /// context that imposes no required type leaves both return-type
    /// candidates standing, reported as an ambiguous expression.
    #[test]
    fn test_error_ambiguous_overloaded_method_call() {
        let src = r#"
            extern E {
                E();
                bit<8> get();
                bit<16> get();
            }
            control C() {
                E() e;
                apply {
                    e.get();
                }
            }
        "#;
        let (_scope, _types, _tables, handler, _potential) = analyze_src(src);
        assert!(handler.has_errors());
    }

    /// EDGE CASE: a left-shift's result type is its left operand's own
    /// type, independent of the (numeric) right operand's width.
    #[test]
    fn test_edge_shift_result_is_left_operand_type() {
        let src = r#"
            control C() {
                apply {
                    bit<16> a;
                    bit<16> shifted;
                    shifted = a << 2;
                }
            }
        "#;
        let (_scope, _types, _tables, handler, _potential) = analyze_src(src);
        assert!(!handler.has_errors());
    }

    /// EDGE CASE: comparing two differently-sized numeric operands is
    /// still a valid `bool`-producing comparison; structural equivalence is
    /// not required for the relational operators.
    #[test]
    fn test_edge_comparison_across_differently_sized_operands() {
        let src = r#"
            control C() {
                apply {
                    bit<8> a;
                    bit<16> b;
                    bool r;
                    r = a == b;
                }
            }
        "#;
        let (_scope, _types, _tables, handler, _potential) = analyze_src(src);
        assert!(!handler.has_errors());
    }

    /// EDGE CASE: a bit-slice subscript's width is computed from its two
    /// literal bounds rather than inherited from the sliced value.
    #[test]
    fn test_edge_bit_slice_width_from_bounds() {
        let src = r#"
            control C() {
                apply {
                    bit<32> w;
                    bit<8> lo;
                    lo = w[7:0];
                }
            }
        "#;
        let (_scope, _types, _tables, handler, _potential) = analyze_src(src);
        assert!(!handler.has_errors());
    }
}
