use graph_spatial::{parse_lat_long_to_point, GeometryType, SpatialError};
use graph_spatial_int_test::test_util::{cleanup, create_test_context, run_test, CORNWALL_WKT};

#[test]
fn test_update_geometry() {
    run_test(
        || create_test_context(),
        |ctx| {
            let paris = ctx.layer("paris")?;
            let eiffel_tower = ctx.name("eiffel_tower");
            let bad_shape = parse_lat_long_to_point(57.322857, -4.424382)?;
            ctx.gateway().create_geometry(&eiffel_tower, &bad_shape.to_wkt(), &paris)?;
            assert!(ctx.geometry_exists(&eiffel_tower)?);

            let shape = parse_lat_long_to_point(48.858370, 2.294481)?;
            let updated = ctx.gateway().update_geometry(&eiffel_tower, &shape.to_wkt(), None)?;
            assert_eq!(updated.wkt(), shape.to_wkt());

            let stored = ctx.gateway().get_geometry(&eiffel_tower, Some(&paris))?;
            assert_eq!(stored.wkt(), "POINT (2.294481 48.85837)");
            assert_eq!(stored.node_id(), updated.node_id());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_update_point_of_interest() {
    run_test(
        || create_test_context(),
        |ctx| {
            let uk = ctx.layer("uk")?;
            let stonehenge = ctx.name("stonehenge");
            ctx.gateway()
                .create_point_of_interest(&stonehenge, &uk, 31.5, -100.1)?;
            let node = ctx.gateway().get_geometry(&stonehenge, None)?;
            assert_eq!(node.wkt(), "POINT (-100.1 31.5)");

            let new_geometry = "POINT (-1.826215 51.178882)";
            ctx.gateway().update_geometry(&stonehenge, new_geometry, None)?;

            let refreshed = ctx.fetch_node(node.node_id())?.expect("geometry should still exist");
            assert_eq!(refreshed.property_str("wkt"), Some(new_geometry));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_update_changes_type_label() {
    run_test(
        || create_test_context(),
        |ctx| {
            let layer = ctx.layer("geometries")?;
            let shape = ctx.name("shape");
            ctx.gateway().create_geometry(&shape, "POINT (30 10)", &layer)?;

            let updated = ctx.gateway().update_geometry(
                &shape,
                "POLYGON ((30 10, 40 40, 20 40, 10 20, 30 10))",
                Some(&layer),
            )?;

            assert_eq!(updated.geometry_type(), GeometryType::Polygon);
            assert!(updated.labels().contains("Polygon"));
            assert!(!updated.labels().contains("Point"));
            assert!(updated.labels().contains(&layer));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_update_geometry_with_invalid_wkt() {
    run_test(
        || create_test_context(),
        |ctx| {
            let uk = ctx.layer("uk")?;
            let cornwall = ctx.name("cornwall");
            ctx.gateway().create_geometry(&cornwall, CORNWALL_WKT, &uk)?;

            let result = ctx.gateway().update_geometry(&cornwall, "Shape(1, 234)", None);
            assert!(matches!(result, Err(SpatialError::InvalidWkt(_))));
            assert_eq!(ctx.gateway().get_geometry(&cornwall, Some(&uk))?.wkt(), CORNWALL_WKT);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_update_geometry_not_found() {
    run_test(
        || create_test_context(),
        |ctx| {
            let shape = parse_lat_long_to_point(57.322857, -4.424382)?;
            let result = ctx
                .gateway()
                .update_geometry(&ctx.name("somewhere"), &shape.to_wkt(), None);
            assert!(matches!(result, Err(SpatialError::GeometryNotFound(_))));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_update_ambiguous_name_needs_layer() {
    run_test(
        || create_test_context(),
        |ctx| {
            let first = ctx.layer("first")?;
            let second = ctx.layer("second")?;
            let shape = ctx.name("shape");
            ctx.gateway().create_geometry(&shape, "POINT (1 2)", &first)?;
            ctx.gateway().create_geometry(&shape, "POINT (3 4)", &second)?;

            assert!(matches!(
                ctx.gateway().update_geometry(&shape, "POINT (5 6)", None),
                Err(SpatialError::AmbiguousGeometry { .. })
            ));

            ctx.gateway().update_geometry(&shape, "POINT (5 6)", Some(&second))?;
            assert_eq!(ctx.gateway().get_geometry(&shape, Some(&first))?.wkt(), "POINT (1 2)");
            assert_eq!(ctx.gateway().get_geometry(&shape, Some(&second))?.wkt(), "POINT (5 6)");
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_layer_named_like_a_geometry_type() {
    run_test(
        || create_test_context(),
        |ctx| {
            let layer = GeometryType::Point.label();
            ctx.gateway().create_layer(layer)?;
            ctx.track_layer(layer);
            let shape = ctx.name("shape");
            let polygon = "POLYGON ((30 10, 40 40, 20 40, 10 20, 30 10))";

            let created = ctx.gateway().create_geometry(&shape, polygon, layer)?;
            assert_eq!(created.geometry_type(), GeometryType::Polygon);

            let updated = ctx.gateway().update_geometry(&shape, "LINESTRING (0 0, 1 1)", Some(layer))?;
            assert_eq!(updated.geometry_type(), GeometryType::LineString);
            assert!(updated.labels().contains(layer));
            assert!(!updated.labels().contains("Polygon"));

            let found = ctx.gateway().get_geometry(&shape, Some(layer))?;
            assert_eq!(found.wkt(), "LINESTRING (0 0, 1 1)");
            assert_eq!(found.layer_name(), Some(layer));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
