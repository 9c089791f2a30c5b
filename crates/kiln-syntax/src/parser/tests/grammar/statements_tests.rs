use indoc::indoc;

use crate::node::NodeData;
use crate::test_utils::{assert_clean, assert_round_trip, count_nodes, find_nodes, with_parse};

fn in_method(body: &str) -> String {
    format!("class C {{ void run() {{ {body} }} }}")
}

#[test]
fn if_else_chain() {
    with_parse(&in_method("if (a) { } else if (b) { } else { }"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "IfStatement"), 2);
    });
}

#[test]
fn while_and_do_while() {
    with_parse(&in_method("while (run) { } do { } while (run);"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "WhileStatement"), 1);
        assert_eq!(count_nodes(result, "DoWhileStatement"), 1);
    });
}

#[test]
fn for_statement_with_all_clauses() {
    with_parse(&in_method("for (int i = 0; i < count; i++) { total = total + i; }"), |result| {
        assert_clean(result);
        let fors = find_nodes(result, "ForStatement");
        assert_eq!(fors.len(), 1);
        let NodeData::ForStatement {
            first_initializer,
            condition,
            first_incrementor,
            body,
        } = result.node(fors[0]).data
        else {
            panic!("not a for statement");
        };
        assert!(first_initializer.is_valid());
        assert!(condition.is_valid());
        assert!(first_incrementor.is_valid());
        assert!(body.is_valid());
    });
}

#[test]
fn for_statement_with_empty_clauses() {
    with_parse(&in_method("for (;;) { break; }"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "ForStatement"), 1);
        assert_eq!(count_nodes(result, "BreakStatement"), 1);
    });
}

#[test]
fn foreach_with_var_and_typed_forms() {
    with_parse(
        &in_method("foreach (var item in items) { } foreach (int value in values) { }"),
        |result| {
            assert_clean(result);
            assert_eq!(count_nodes(result, "ForeachStatement"), 2);
        },
    );
}

#[test]
fn switch_statement_sections() {
    let body = indoc! {"
        switch (mode) {
            case 1:
            case 2 when strict:
                run();
                break;
            default:
                break;
        }
    "};
    with_parse(&in_method(body), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "SwitchStatement"), 1);
        // The two case labels share one section; default has its own.
        assert_eq!(count_nodes(result, "SwitchSection"), 2);
        assert_eq!(count_nodes(result, "SwitchSectionLabel"), 3);

        let labels = find_nodes(result, "SwitchSectionLabel");
        let NodeData::SwitchSectionLabel { guard, .. } = result.node(labels[1]).data else {
            panic!("not a label");
        };
        assert!(guard.is_valid(), "second label carries the when guard");
    });
}

#[test]
fn try_catch_finally() {
    let body = "try { } catch (IoFailure error) { } catch { } finally { }";
    with_parse(&in_method(body), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "TryStatement"), 1);
        assert_eq!(count_nodes(result, "CatchClause"), 2);
    });
}

#[test]
fn bare_try_is_an_error() {
    with_parse(&in_method("try { }"), |result| {
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors.get(0).message.contains("at least one catch"));
    });
}

#[test]
fn using_statement_block_form() {
    with_parse(&in_method("using (var file = open()) { }"), |result| {
        assert_clean(result);
        let usings = find_nodes(result, "UsingStatement");
        assert_eq!(usings.len(), 1);
        let NodeData::UsingStatement { acquisition, body } = result.node(usings[0]).data else {
            panic!("not a using statement");
        };
        assert!(acquisition.is_valid());
        assert!(body.is_valid());
    });
}

#[test]
fn using_statement_scoped_form() {
    with_parse(&in_method("using Lock guard = acquire();"), |result| {
        assert_clean(result);
        let usings = find_nodes(result, "UsingStatement");
        assert_eq!(usings.len(), 1);
        let NodeData::UsingStatement { body, .. } = result.node(usings[0]).data else {
            panic!("not a using statement");
        };
        assert!(!body.is_valid(), "scoped form has no body of its own");
    });
}

#[test]
fn with_statement() {
    with_parse(&in_method("with (canvas) { draw(); }"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "WithStatement"), 1);
    });
}

#[test]
fn local_variables_with_multiple_declarators() {
    with_parse(&in_method("int a = 1, b, c = other;"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "LocalVariableDeclaration"), 1);
        assert_eq!(count_nodes(result, "LocalVariableDeclarator"), 3);
    });
}

#[test]
fn var_and_storage_class_declarations() {
    with_parse(&in_method("var x = 1; temp var y = 2; scoped Buffer z = make();"), |result| {
        assert_clean(result);
        let declarations = find_nodes(result, "LocalVariableDeclaration");
        assert_eq!(declarations.len(), 3);

        let NodeData::LocalVariableDeclaration { is_var, storage, .. } =
            result.node(declarations[1]).data
        else {
            panic!("not a declaration");
        };
        assert!(is_var);
        assert_eq!(storage, crate::node::StorageClass::Temp);
    });
}

#[test]
fn local_constant() {
    with_parse(&in_method("const int limit = 8;"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "LocalConstantDeclaration"), 1);
    });
}

#[test]
fn return_and_throw() {
    with_parse(&in_method("if (bad) { throw error; } return value;"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "ThrowStatement"), 1);
        assert_eq!(count_nodes(result, "ReturnStatement"), 1);
    });
}

#[test]
fn expression_statements() {
    with_parse(&in_method("counter++; log(counter); total = total + 1;"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "ExpressionStatement"), 3);
    });
}

#[test]
fn declaration_does_not_shadow_comparison() {
    // `a < b;` must parse as a comparison expression, not a mangled
    // variable declaration.
    with_parse(&in_method("a < b;"), |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "LocalVariableDeclaration"), 0);
        assert_eq!(count_nodes(result, "BinaryExpression"), 1);
    });
}

#[test]
fn statements_round_trip() {
    let body = indoc! {"
        int total = 0;
        for (int i = 0; i < 10; i++) {
            total += i; // accumulate
        }
        return total;
    "};
    with_parse(&in_method(body), |result| {
        assert_clean(result);
        assert_round_trip(result);
    });
}
