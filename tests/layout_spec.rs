use serde_json::{json, Map, Value};
use speculate2::speculate;
use studio_designer::layout::*;
use studio_designer::models::*;

fn layout_fixture() -> Value {
    json!({
        "$schema": LAYOUT_SCHEMA_URL,
        "data": {
            "layout": [
                {
                    "id": "header-1",
                    "type": "Header",
                    "size": "L",
                    "textResourceBindings": { "title": "Personalia" }
                },
                {
                    "id": "group-1",
                    "type": "Group",
                    "children": ["input-1", "group-2"],
                    "maxCount": 1
                },
                {
                    "id": "input-1",
                    "type": "Input",
                    "dataModelBindings": { "simpleBinding": "person.name" },
                    "required": true
                },
                {
                    "id": "group-2",
                    "type": "Group",
                    "children": ["paragraph-1"]
                },
                {
                    "id": "paragraph-1",
                    "type": "Paragraph"
                },
                {
                    "id": "navigation",
                    "type": "NavigationButtons",
                    "showBackButton": true
                }
            ],
            "hidden": false
        },
        "customRootProperty": "kept"
    })
}

fn external_ids(document: &ExternalFormLayout) -> Vec<String> {
    document.data.layout.iter().map(|c| c.id.clone()).collect()
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected a JSON object"),
    }
}

speculate! {
    describe "convert_external_to_internal" {
        before {
            let conversion = convert_external_to_internal(&layout_fixture());
            let layout = conversion.layout.clone();
        }

        it "converts a valid layout without issues" {
            assert!(conversion.is_valid(), "issues: {:?}", conversion.issues);
            assert!(layout.validate().is_ok());
        }

        it "places unreferenced entries under the root in file order" {
            assert_eq!(
                layout.children_of(BASE_CONTAINER_ID),
                ["header-1", "group-1", "navigation"]
            );
            assert_eq!(layout.children_of("group-1"), ["input-1", "group-2"]);
            assert_eq!(layout.children_of("group-2"), ["paragraph-1"]);
        }

        it "splits components from containers" {
            assert_eq!(layout.components.len(), 4);
            assert!(layout.containers.contains_key("group-1"));
            assert!(layout.containers.contains_key(BASE_CONTAINER_ID));
            assert_eq!(layout.components["input-1"].item_type, ItemType::Component);
            assert_eq!(layout.parent_of("paragraph-1"), Some("group-2"));
        }

        it "keeps free-form properties and custom keys" {
            assert_eq!(layout.components["input-1"].properties["required"], json!(true));
            assert_eq!(layout.containers["group-1"].properties["maxCount"], json!(1));
            assert_eq!(layout.custom_root_properties["customRootProperty"], json!("kept"));
            assert_eq!(layout.custom_data_properties["hidden"], json!(false));
        }
    }

    describe "round trip" {
        it "preserves every id and the file order" {
            let fixture = layout_fixture();
            let conversion = convert_external_to_internal(&fixture);
            let external = convert_internal_to_external(&conversion.layout);

            assert_eq!(
                external_ids(&external),
                ["header-1", "group-1", "input-1", "group-2", "paragraph-1", "navigation"]
            );
            assert_eq!(serde_json::to_value(&external).unwrap(), fixture);
        }

        it "writes page prefixes back for multi-page groups" {
            let fixture = json!({
                "$schema": LAYOUT_SCHEMA_URL,
                "data": { "layout": [
                    {
                        "id": "repeating",
                        "type": "Group",
                        "children": ["0:name", "1:email"],
                        "edit": { "multiPage": true },
                        "maxCount": 3
                    },
                    { "id": "name", "type": "Input" },
                    { "id": "email", "type": "Input" }
                ]}
            });
            let conversion = convert_external_to_internal(&fixture);
            assert!(conversion.is_valid());
            assert_eq!(conversion.layout.components["email"].page_index, Some(1));

            let external = convert_internal_to_external(&conversion.layout);
            assert_eq!(
                external.data.layout[0].children,
                Some(vec!["0:name".to_string(), "1:email".to_string()])
            );
        }

        it "survives editing before export" {
            let mut layout = convert_external_to_internal(&layout_fixture()).layout;
            layout
                .add_item(
                    FormItem::new("button-1", ComponentType::Button),
                    BASE_CONTAINER_ID,
                    Some(1),
                )
                .unwrap();
            layout.move_item("paragraph-1", BASE_CONTAINER_ID, None).unwrap();
            layout.remove_item("group-2").unwrap();

            let external = convert_internal_to_external(&layout);
            assert_eq!(
                external_ids(&external),
                ["header-1", "button-1", "group-1", "input-1", "navigation", "paragraph-1"]
            );
            let reimported = convert_external_to_internal(&serde_json::to_value(&external).unwrap());
            assert!(reimported.is_valid());
            assert_eq!(reimported.layout, layout);
        }
    }

    describe "invalid references" {
        it "drops children that do not exist and reports them" {
            let document = json!({ "data": { "layout": [
                { "id": "group-1", "type": "Group", "children": ["input-1", "ghost"] },
                { "id": "input-1", "type": "Input" }
            ]}});
            let conversion = convert_external_to_internal(&document);

            assert_eq!(conversion.layout.children_of("group-1"), ["input-1"]);
            assert_eq!(
                conversion.issues,
                vec![LayoutIssue::UnresolvedChild {
                    parent: "group-1".to_string(),
                    child: "ghost".to_string(),
                }]
            );
        }

        it "keeps only the first reference to a shared child" {
            let document = json!({ "data": { "layout": [
                { "id": "group-a", "type": "Group", "children": ["input-1"] },
                { "id": "group-b", "type": "Group", "children": ["input-1"] },
                { "id": "input-1", "type": "Input" }
            ]}});
            let conversion = convert_external_to_internal(&document);

            assert_eq!(conversion.layout.children_of("group-a"), ["input-1"]);
            assert!(conversion.layout.children_of("group-b").is_empty());
            assert!(matches!(
                conversion.issues.as_slice(),
                [LayoutIssue::DuplicateReference { .. }]
            ));
        }

        it "drops entries with unknown types" {
            let document = json!({ "data": { "layout": [
                { "id": "mystery", "type": "Hologram" },
                { "id": "input-1", "type": "Input" }
            ]}});
            let conversion = convert_external_to_internal(&document);

            assert!(!conversion.layout.contains("mystery"));
            assert!(conversion.layout.contains("input-1"));
            assert_eq!(conversion.issues.len(), 1);
        }

        it "reports every group of a cycle as orphaned" {
            let document = json!({ "data": { "layout": [
                { "id": "g1", "type": "Group", "children": ["g2"] },
                { "id": "g2", "type": "Group", "children": ["g1"] }
            ]}});
            let conversion = convert_external_to_internal(&document);

            assert_eq!(
                conversion.issues,
                vec![
                    LayoutIssue::Orphaned { id: "g1".to_string() },
                    LayoutIssue::Orphaned { id: "g2".to_string() },
                ]
            );
            assert!(conversion.layout.children_of(BASE_CONTAINER_ID).is_empty());
            assert!(!conversion.layout.contains("g1"));
            assert!(!conversion.layout.contains("g2"));
        }

        it "orphans the children of a container with an unknown type" {
            let document = json!({ "data": { "layout": [
                { "id": "box", "type": "Hologram", "children": ["input-1"] },
                { "id": "input-1", "type": "Input" },
                { "id": "input-2", "type": "Input" }
            ]}});
            let conversion = convert_external_to_internal(&document);

            assert_eq!(
                conversion.issues,
                vec![
                    LayoutIssue::UnknownType {
                        id: "box".to_string(),
                        type_name: Some("Hologram".to_string()),
                    },
                    LayoutIssue::Orphaned { id: "input-1".to_string() },
                ]
            );
            assert_eq!(conversion.layout.children_of(BASE_CONTAINER_ID), ["input-2"]);
        }

        it "reports entries without an object shape or an id by position" {
            let document = json!({ "data": { "layout": [
                42,
                { "type": "Input" },
                { "id": "", "type": "Input" },
                { "id": "input-1", "type": "Input" }
            ]}});
            let conversion = convert_external_to_internal(&document);

            assert_eq!(
                conversion.issues,
                vec![
                    LayoutIssue::MalformedEntry { index: 0 },
                    LayoutIssue::MalformedEntry { index: 1 },
                    LayoutIssue::MalformedEntry { index: 2 },
                ]
            );
            assert_eq!(conversion.layout.children_of(BASE_CONTAINER_ID), ["input-1"]);
        }

        it "skips child references that are not strings" {
            let document = json!({ "data": { "layout": [
                { "id": "group-1", "type": "Group", "children": [7, "input-1"] },
                { "id": "input-1", "type": "Input" }
            ]}});
            let conversion = convert_external_to_internal(&document);

            assert_eq!(
                conversion.issues,
                vec![LayoutIssue::MalformedChild { parent: "group-1".to_string() }]
            );
            assert_eq!(conversion.layout.children_of("group-1"), ["input-1"]);
        }

        it "rejects a data section that is not an object" {
            let document = json!({ "data": [] });
            let conversion = convert_external_to_internal(&document);

            assert!(matches!(
                conversion.issues.as_slice(),
                [LayoutIssue::MalformedDocument(_)]
            ));
            assert!(conversion.layout.children_of(BASE_CONTAINER_ID).is_empty());
            assert!(conversion.layout.components.is_empty());
        }

        it "reports layouts with issues by name" {
            let mut layouts = std::collections::BTreeMap::new();
            layouts.insert("good".to_string(), layout_fixture());
            layouts.insert(
                "broken".to_string(),
                json!({ "data": { "layout": [
                    { "id": "buttons", "type": "ButtonGroup", "children": ["input-1"] },
                    { "id": "input-1", "type": "Input" }
                ]}}),
            );
            let converted = convert_external_layouts(&layouts);

            assert_eq!(converted.invalid_layouts, vec!["broken".to_string()]);
            assert_eq!(converted.converted_layouts.len(), 2);
            assert!(!converted.converted_layouts["broken"].contains("input-1"));
        }
    }

    describe "update_properties" {
        before {
            let mut layout = convert_external_to_internal(&layout_fixture()).layout;
        }

        it "merges nested objects and removes null keys" {
            layout
                .update_properties(
                    "header-1",
                    &object(json!({
                        "textResourceBindings": { "description": "Intro" },
                        "size": null
                    })),
                )
                .unwrap();

            let header = &layout.components["header-1"];
            assert_eq!(
                header.properties["textResourceBindings"],
                json!({ "title": "Personalia", "description": "Intro" })
            );
            assert!(!header.properties.contains_key("size"));
        }

        it "refuses to change the id" {
            let result = layout.update_properties("header-1", &object(json!({ "id": "x" })));
            assert_eq!(result, Err(LayoutError::ImmutableProperty("id".to_string())));
        }

        it "fails for unknown items" {
            let result = layout.update_properties("ghost", &object(json!({ "a": 1 })));
            assert_eq!(result, Err(LayoutError::ItemNotFound("ghost".to_string())));
        }
    }
}
