use indoc::indoc;

use crate::node::{Modifiers, NodeData};
use crate::test_utils::{assert_clean, assert_round_trip, count_nodes, find_nodes, with_parse};

#[test]
fn class_with_base_list_and_generics() {
    with_parse("public sealed class Widget<T, U> : Base, Drawable<T> { }", |result| {
        assert_clean(result);
        assert_round_trip(result);
        assert_eq!(count_nodes(result, "ClassDeclaration"), 1);
        assert_eq!(count_nodes(result, "TypeParameterList"), 1);
        assert_eq!(count_nodes(result, "TypeList"), 1);
        // Base and Drawable<T>.
        assert_eq!(count_nodes(result, "TypePath"), 3);
    });
}

#[test]
fn modifier_bits_are_recorded() {
    with_parse("public static class C { }", |result| {
        assert_clean(result);
        let lists = find_nodes(result, "ModifierList");
        assert_eq!(lists.len(), 1);
        let NodeData::ModifierList { modifiers } = result.node(lists[0]).data else {
            panic!("not a modifier list");
        };
        assert!(modifiers.contains(Modifiers::PUBLIC));
        assert!(modifiers.contains(Modifiers::STATIC));
        assert!(!modifiers.contains(Modifiers::SEALED));
    });
}

#[test]
fn duplicate_modifier_is_an_error() {
    with_parse("public public class C { }", |result| {
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors.get(0).message.contains("duplicate modifier"));
    });
}

#[test]
fn conflicting_modifiers_are_an_error() {
    with_parse("sealed abstract class C { }", |result| {
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors.get(0).message.contains("conflicts"));
    });
}

#[test]
fn struct_declaration() {
    with_parse("struct Point { float x; float y; }", |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "StructDeclaration"), 1);
        assert_eq!(count_nodes(result, "FieldDeclaration"), 2);
    });
}

#[test]
fn enum_with_backing_type_and_values() {
    let src = indoc! {"
        enum Color : byte {
            Red,
            Green = 2,
            Blue,
        }
    "};
    with_parse(src, |result| {
        assert_clean(result);
        assert_round_trip(result);
        assert_eq!(count_nodes(result, "EnumDeclaration"), 1);
        assert_eq!(count_nodes(result, "EnumMember"), 3);
        assert_eq!(count_nodes(result, "LiteralExpression"), 1);
    });
}

#[test]
fn delegate_declaration() {
    with_parse("public delegate int Combine(int a, int b);", |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "DelegateDeclaration"), 1);
        assert_eq!(count_nodes(result, "FormalParameter"), 2);
    });
}

#[test]
fn constructor_declaration() {
    with_parse("class C { constructor(int size) { } }", |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "ConstructorDeclaration"), 1);
        assert_eq!(count_nodes(result, "FormalParameter"), 1);
    });
}

#[test]
fn constant_member() {
    with_parse("class C { const int Max = 100; }", |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "ConstantDeclaration"), 1);
    });
}

#[test]
fn method_with_block_body() {
    with_parse("class C { void run(int count) { return; } }", |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "MethodDeclaration"), 1);
        assert_eq!(count_nodes(result, "ReturnStatement"), 1);
    });
}

#[test]
fn bodyless_method() {
    with_parse("class C { abstract void run(); }", |result| {
        assert_clean(result);
        let methods = find_nodes(result, "MethodDeclaration");
        assert_eq!(methods.len(), 1);
        let NodeData::MethodDeclaration { body, arrow_body, .. } = result.node(methods[0]).data
        else {
            panic!("not a method");
        };
        assert!(!body.is_valid());
        assert!(!arrow_body.is_valid());
    });
}

#[test]
fn property_with_both_accessors() {
    with_parse("class C { int Size { get; private set; } }", |result| {
        assert_clean(result);
        let properties = find_nodes(result, "PropertyDeclaration");
        assert_eq!(properties.len(), 1);
        let NodeData::PropertyDeclaration { getter, setter, .. } = result.node(properties[0]).data
        else {
            panic!("not a property");
        };
        assert!(getter.is_valid());
        assert!(setter.is_valid());

        let NodeData::PropertySetter { visibility, .. } = result.node(setter).data else {
            panic!("not a setter");
        };
        assert_eq!(visibility, crate::node::Visibility::Private);
    });
}

#[test]
fn setter_with_named_value() {
    with_parse("class C { int Size { set |incoming| { size = incoming; } } }", |result| {
        assert_clean(result);
        let setters = find_nodes(result, "PropertySetter");
        assert_eq!(setters.len(), 1);
        let NodeData::PropertySetter { value_identifier, block, .. } =
            result.node(setters[0]).data
        else {
            panic!("not a setter");
        };
        assert!(value_identifier.is_valid());
        assert!(block.is_valid());
    });
}

#[test]
fn duplicate_getter_is_an_error() {
    with_parse("class C { int X { get; get; } }", |result| {
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors.get(0).message.contains("duplicate getter"));
    });
}

#[test]
fn indexer_declaration() {
    with_parse("class C { int this[int index] { get => 0; set; } }", |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "IndexerDeclaration"), 1);
        assert_eq!(count_nodes(result, "FormalParameter"), 1);
    });
}

#[test]
fn using_directives() {
    let src = indoc! {"
        using Game::Core;
        using static Math;
        using Vec = Game::Math::Vector3;
    "};
    with_parse(src, |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "UsingNamespace"), 1);
        assert_eq!(count_nodes(result, "UsingStatic"), 1);
        assert_eq!(count_nodes(result, "UsingAlias"), 1);
    });
}

#[test]
fn namespace_declaration_with_members() {
    let src = indoc! {"
        namespace Game::Core {
            class A { }
            struct B { }
        }
    "};
    with_parse(src, |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "NamespaceDeclaration"), 1);
        assert_eq!(count_nodes(result, "ClassDeclaration"), 1);
        assert_eq!(count_nodes(result, "StructDeclaration"), 1);
    });
}

#[test]
fn interface_is_reported_as_unsupported() {
    with_parse("interface Drawable { }", |result| {
        assert!(!result.is_clean());
        assert!(result
            .errors
            .iter()
            .any(|error| error.message.contains("not supported")));
        assert_eq!(count_nodes(result, "InterfaceDeclaration"), 1);
        assert_round_trip(result);
    });
}

#[test]
fn nested_type_declarations() {
    with_parse("class Outer { class Inner { int x; } }", |result| {
        assert_clean(result);
        assert_eq!(count_nodes(result, "ClassDeclaration"), 2);
    });
}

#[test]
fn default_parameter_values() {
    with_parse("class C { void f(int a, int b = 2) { } }", |result| {
        assert_clean(result);
        let parameters = find_nodes(result, "FormalParameter");
        assert_eq!(parameters.len(), 2);
        let NodeData::FormalParameter { default_value, .. } = result.node(parameters[1]).data
        else {
            panic!("not a parameter");
        };
        assert!(default_value.is_valid());
    });
}

#[test]
fn parameter_storage_and_pass_by() {
    with_parse("class C { void f(temp ref int a, out int b) { } }", |result| {
        assert_clean(result);
        let parameters = find_nodes(result, "FormalParameter");
        assert_eq!(parameters.len(), 2);

        let NodeData::FormalParameter { storage, pass_by, .. } = result.node(parameters[0]).data
        else {
            panic!("not a parameter");
        };
        assert_eq!(storage, crate::node::StorageClass::Temp);
        assert_eq!(pass_by, crate::node::PassBy::Ref);

        let NodeData::FormalParameter { storage, pass_by, .. } = result.node(parameters[1]).data
        else {
            panic!("not a parameter");
        };
        assert_eq!(storage, crate::node::StorageClass::Default);
        assert_eq!(pass_by, crate::node::PassBy::Out);
    });
}
