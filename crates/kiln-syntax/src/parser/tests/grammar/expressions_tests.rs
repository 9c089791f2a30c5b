use crate::node::{AllocatorKind, BinaryOp, LiteralKind, NodeData, StringPartKind};
use crate::test_utils::{assert_clean, assert_round_trip, count_nodes, find_nodes, with_parse};

fn expr(source: &str) -> String {
    format!("class C {{ void run() {{ result = {source}; }} }}")
}

fn binary_ops(result: &crate::ParseResult<'_>) -> Vec<BinaryOp> {
    find_nodes(result, "BinaryExpression")
        .into_iter()
        .map(|id| match result.node(id).data {
            NodeData::BinaryExpression { op, .. } => op,
            _ => unreachable!(),
        })
        .collect()
}

#[test]
fn multiplicative_binds_tighter_than_additive() {
    with_parse(&expr("a + b * c"), |result| {
        assert_clean(result);
        let adds = find_nodes(result, "BinaryExpression");
        assert_eq!(adds.len(), 2);
        // Pre-order: the Add wrapper encloses the Multiply.
        let NodeData::BinaryExpression { op, rhs, .. } = result.node(adds[0]).data else {
            unreachable!();
        };
        assert_eq!(op, BinaryOp::Add);
        assert_eq!(result.node(rhs).kind_name(), "BinaryExpression");
    });
}

#[test]
fn left_associativity_via_precede() {
    with_parse(&expr("a - b - c"), |result| {
        assert_clean(result);
        let subs = find_nodes(result, "BinaryExpression");
        assert_eq!(subs.len(), 2);
        // The outer node wraps the earlier subtraction as its lhs.
        let NodeData::BinaryExpression { lhs, .. } = result.node(subs[0]).data else {
            unreachable!();
        };
        assert_eq!(result.node(lhs).kind_name(), "BinaryExpression");
    });
}

#[test]
fn full_precedence_ladder() {
    with_parse(&expr("a ?? b || c && d | e ^ f & g == h < i + j * k"), |result| {
        assert_clean(result);
        let ops = binary_ops(result);
        assert_eq!(
            ops,
            vec![
                BinaryOp::Coalesce,
                BinaryOp::ConditionalOr,
                BinaryOp::ConditionalAnd,
                BinaryOp::BitwiseOr,
                BinaryOp::BitwiseXor,
                BinaryOp::BitwiseAnd,
                BinaryOp::Equal,
                BinaryOp::LessThan,
                BinaryOp::Add,
                BinaryOp::Multiply,
            ]
        );
    });
}

#[test]
fn shift_requires_adjacent_brackets() {
    with_parse(&expr("a << 2"), |result| {
        assert_clean(result);
        assert_eq!(binary_ops(result), vec![BinaryOp::ShiftLeft]);
    });
    with_parse(&expr("a >> 2"), |result| {
        assert_clean(result);
        assert_eq!(binary_ops(result), vec![BinaryOp::ShiftRight]);
    });
}

#[test]
fn spaced_angle_brackets_are_a_syntax_error() {
    with_parse(&expr("a < < b"), |result| {
        assert!(!result.is_clean());
        assert_round_trip(result);
    });
}

#[test]
fn compound_shift_assign_is_one_operator() {
    with_parse("class C { void run() { a <<= b; } }", |result| {
        assert_clean(result);
        let assignments = find_nodes(result, "AssignmentExpression");
        assert_eq!(assignments.len(), 1);
        let NodeData::AssignmentExpression { op, .. } = result.node(assignments[0]).data else {
            unreachable!();
        };
        assert_eq!(op, crate::node::AssignOp::ShiftLeft);
    });
}

#[test]
fn ternary_expression() {
    with_parse(&expr("flag ? a : b"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "TernaryExpression"), 1);
    });
}

#[test]
fn unary_operators() {
    with_parse(&expr("-a + !b + ~c + ++d"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "UnaryExpression"), 4);
    });
}

#[test]
fn postfix_increment() {
    with_parse(&expr("a++ + b"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "PostfixExpression"), 1);
    });
}

#[test]
fn cast_versus_parenthesized() {
    with_parse(&expr("(int)a"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "CastExpression"), 1);
        assert_eq!(count_nodes(result, "ParenExpression"), 0);
    });
    with_parse(&expr("(a) + b"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "CastExpression"), 0);
        assert_eq!(count_nodes(result, "ParenExpression"), 1);
    });
}

#[test]
fn lambda_with_typed_parameters() {
    with_parse(&expr("(int x, float y) => x"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "LambdaExpression"), 1);
        assert_eq!(count_nodes(result, "LambdaParameter"), 2);
    });
}

#[test]
fn lambda_with_block_body() {
    with_parse(&expr("(x) => { return x; }"), |result| {
        assert_clean(result);
        let lambdas = find_nodes(result, "LambdaExpression");
        assert_eq!(lambdas.len(), 1);
        let NodeData::LambdaExpression { block, .. } = result.node(lambdas[0]).data else {
            unreachable!();
        };
        assert!(block.is_valid());
    });
}

#[test]
fn single_identifier_lambda() {
    with_parse(&expr("x => x + 1"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "LambdaExpression"), 1);
        assert_eq!(count_nodes(result, "LambdaParameter"), 1);
    });
}

#[test]
fn member_access_chains() {
    with_parse(&expr("a.b?.c::d.run(1)[0]"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "PrimaryExpression"), 1);
        assert_eq!(count_nodes(result, "MemberAccess"), 4);
        assert_eq!(count_nodes(result, "MethodInvocation"), 1);
        assert_eq!(count_nodes(result, "BracketExpression"), 1);
    });
}

#[test]
fn invocation_with_out_declarations() {
    with_parse(&expr("parse(text, out var value) && use(out int count)"), |result| {
        assert_clean(result);
        let arguments = find_nodes(result, "Argument");
        let declarations: Vec<_> = arguments
            .iter()
            .filter_map(|&id| match result.node(id).data {
                NodeData::Argument { is_declaration, is_var, .. } if is_declaration => {
                    Some(is_var)
                }
                _ => None,
            })
            .collect();
        assert_eq!(declarations, vec![true, false]);
    });
}

#[test]
fn new_with_arguments_and_initializer() {
    with_parse(&expr("new Widget(1, 2) { Size = 3, [0] = 4, 5 }"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "NewExpression"), 1);
        assert_eq!(count_nodes(result, "MemberInitializer"), 1);
        assert_eq!(count_nodes(result, "IndexedInitializer"), 1);
        assert_eq!(count_nodes(result, "ListInitializer"), 1);
    });
}

#[test]
fn new_with_allocator_keywords() {
    with_parse(&expr("new tempalloc Buffer(64)"), |result| {
        assert_clean(result);
        let news = find_nodes(result, "NewExpression");
        let NodeData::NewExpression { allocator, .. } = result.node(news[0]).data else {
            unreachable!();
        };
        assert_eq!(allocator, AllocatorKind::Temp);
    });
}

#[test]
fn dynamic_object_and_array_literals() {
    with_parse(&expr("new dynamic { name: \"kiln\", size: 3 }"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "DynamicObjectExpression"), 1);
        assert_eq!(count_nodes(result, "DynamicKeyValue"), 2);
    });
    with_parse(&expr("new dynamic [1, 2, 3]"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "DynamicArrayExpression"), 1);
    });
}

#[test]
fn type_queries_and_default() {
    with_parse(&expr("typeof(Widget)"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "TypeOfExpression"), 1);
    });
    with_parse(&expr("sizeof(int)"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "SizeOfExpression"), 1);
    });
    with_parse(&expr("nameof(widget.size)"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "NameOfExpression"), 1);
    });
    with_parse(&expr("default(int)"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "DefaultExpression"), 1);
    });
    with_parse(&expr("default"), |result| {
        assert_clean(result);
        let literals = find_nodes(result, "LiteralExpression");
        assert!(literals.iter().any(|&id| matches!(
            result.node(id).data,
            NodeData::LiteralExpression { literal: LiteralKind::Default }
        )));
    });
}

#[test]
fn is_and_as_expressions() {
    with_parse(&expr("shape is Circle circle"), |result| {
        assert_clean(result);
        let checks = find_nodes(result, "IsExpression");
        assert_eq!(checks.len(), 1);
        let NodeData::IsExpression { identifier, .. } = result.node(checks[0]).data else {
            unreachable!();
        };
        assert!(identifier.is_valid());
    });
    with_parse(&expr("shape as! Circle"), |result| {
        assert_clean(result);
        let casts = find_nodes(result, "AsExpression");
        assert_eq!(casts.len(), 1);
        let NodeData::AsExpression { panic_on_failure, .. } = result.node(casts[0]).data else {
            unreachable!();
        };
        assert!(panic_on_failure);
    });
}

#[test]
fn switch_expression_with_arms() {
    with_parse(&expr("mode switch { 1 => run(), other when other > 2 => stop(), _ => idle() }"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "SwitchExpression"), 1);
        assert_eq!(count_nodes(result, "SwitchExpressionArm"), 3);
    });
}

#[test]
fn throw_expression_in_coalesce() {
    with_parse(&expr("value ?? throw failure()"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "ThrowExpression"), 1);
    });
}

#[test]
fn interpolated_string_parts() {
    with_parse(&expr("$\"a${1+2}b\""), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "StringLiteralExpression"), 1);

        let parts = find_nodes(result, "StringPart");
        let kinds: Vec<StringPartKind> = parts
            .iter()
            .map(|&id| match result.node(id).data {
                NodeData::StringPart { part, .. } => part,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                StringPartKind::Regular,
                StringPartKind::LongInterpolation,
                StringPartKind::Regular,
            ]
        );

        let NodeData::StringPart { expression, .. } = result.node(parts[1]).data else {
            unreachable!();
        };
        let NodeData::BinaryExpression { op, .. } = result.node(expression).data else {
            panic!("interpolation does not hold a binary expression");
        };
        assert_eq!(op, BinaryOp::Add);
    });
}

#[test]
fn short_interpolation_part() {
    with_parse(&expr("\"hello $name!\""), |result| {
        assert_clean(result);
        let parts = find_nodes(result, "StringPart");
        assert!(parts.iter().any(|&id| matches!(
            result.node(id).data,
            NodeData::StringPart { part: StringPartKind::ShortInterpolation, .. }
        )));
    });
}

#[test]
fn character_and_style_literals() {
    with_parse(&expr("'x'"), |result| {
        assert_clean(result);
        let literals = find_nodes(result, "LiteralExpression");
        assert!(literals.iter().any(|&id| matches!(
            result.node(id).data,
            NodeData::LiteralExpression { literal: LiteralKind::Character }
        )));
    });
    with_parse(&expr("`bold`"), |result| {
        assert_clean(result);
        let literals = find_nodes(result, "LiteralExpression");
        assert!(literals.iter().any(|&id| matches!(
            result.node(id).data,
            NodeData::LiteralExpression { literal: LiteralKind::Style }
        )));
    });
}

#[test]
fn numeric_overflow_is_reported() {
    with_parse(&expr("2147483648"), |result| {
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors.get(0).message.contains("overflows int32"));
    });
    with_parse(&expr("2147483647"), |result| {
        assert_clean(result);
    });
    with_parse(&expr("4294967295u"), |result| {
        assert_clean(result);
    });
    with_parse(&expr("4294967296u"), |result| {
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors.get(0).message.contains("overflows uint32"));
    });
}

#[test]
fn ref_expression() {
    with_parse(&expr("ref buffer"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "RefExpression"), 1);
    });
}

#[test]
fn complex_expression_round_trips() {
    with_parse(
        &expr("a?.b(x, out var y)[i + 1] ?? new Widget { Size = n switch { 1 => 2, _ => 3 } }"),
        |result| {
            assert_clean(result);
            assert_round_trip(result);
        },
    );
}
