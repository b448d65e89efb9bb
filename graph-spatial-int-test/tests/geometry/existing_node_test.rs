use std::collections::BTreeSet;

use graph_spatial::{parse_lat_long_to_point, SpatialError, NAME_PROPERTY, SPATIAL_LABEL};
use graph_spatial_int_test::test_util::{cleanup, create_test_context, run_test};
use serde_json::json;

const ADDRESS: &str = "300 St John Street, London.";

#[test]
fn test_make_existing_node_spatially_aware() {
    run_test(
        || create_test_context(),
        |ctx| {
            let node = ctx.create_plain_node(json!({"address": ADDRESS}))?;
            let shape = parse_lat_long_to_point(51.528453, -0.104489)?;
            let layer = ctx.layer("mylayer")?;
            let geometry_name = ctx.name("mygeom");

            ctx.gateway()
                .add_node_to_layer_by_id(node.id, &geometry_name, &shape.to_wkt(), &layer)?;

            let stored = ctx.fetch_node(node.id)?.expect("node should still exist");
            let expected: BTreeSet<String> = [SPATIAL_LABEL, layer.as_str(), "Point"]
                .iter()
                .map(|l| l.to_string())
                .collect();
            assert_eq!(stored.labels, expected);
            assert_eq!(stored.property_str(NAME_PROPERTY), Some(geometry_name.as_str()));
            assert_eq!(stored.property_str("address"), Some(ADDRESS));
            assert_eq!(stored.property_str("wkt"), Some("POINT (-0.104489 51.528453)"));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_add_node_to_layer_return_values() {
    run_test(
        || create_test_context(),
        |ctx| {
            let node = ctx.create_plain_node(json!({"address": ADDRESS}))?;
            let shape = parse_lat_long_to_point(51.528453, -0.104489)?;
            let layer = ctx.layer("mylayer")?;

            let geometry = ctx.gateway().add_node_to_layer_by_id(
                node.id,
                &ctx.name("mygeom"),
                &shape.to_wkt(),
                &layer,
            )?;

            assert_eq!(geometry.node_id(), node.id);
            assert_eq!(geometry.layer_name(), Some(layer.as_str()));
            assert_eq!(geometry.node().property_str("address"), Some(ADDRESS));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_add_node_does_not_create_nodes() {
    run_test(
        || create_test_context(),
        |ctx| {
            let node = ctx.create_plain_node(json!({"address": ADDRESS}))?;
            let layer = ctx.layer("mylayer")?;
            let before = ctx.memory().map(|graph| graph.node_count());

            ctx.gateway()
                .add_node_to_layer_by_id(node.id, &ctx.name("mygeom"), "POINT (1 2)", &layer)?;

            if let (Some(graph), Some(before)) = (ctx.memory(), before) {
                assert_eq!(graph.node_count(), before);
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_add_missing_node() {
    run_test(
        || create_test_context(),
        |ctx| {
            let layer = ctx.layer("mylayer")?;
            let result = ctx.gateway().add_node_to_layer_by_id(
                i64::MAX,
                &ctx.name("mygeom"),
                "POINT (1 2)",
                &layer,
            );
            assert!(matches!(result, Err(SpatialError::NodeNotFound(id)) if id == i64::MAX));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_add_node_with_taken_name() {
    run_test(
        || create_test_context(),
        |ctx| {
            let layer = ctx.layer("mylayer")?;
            let geometry_name = ctx.name("mygeom");
            ctx.gateway().create_geometry(&geometry_name, "POINT (1 2)", &layer)?;

            let node = ctx.create_plain_node(json!({"address": ADDRESS}))?;
            let result = ctx
                .gateway()
                .add_node_to_layer_by_id(node.id, &geometry_name, "POINT (3 4)", &layer);
            assert!(matches!(result, Err(SpatialError::GeometryExists { .. })));

            let untouched = ctx.fetch_node(node.id)?.expect("node should still exist");
            assert!(untouched.labels.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
