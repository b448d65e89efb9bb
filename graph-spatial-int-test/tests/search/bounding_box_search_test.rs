use graph_spatial::SpatialError;
use graph_spatial_int_test::test_util::{
    cleanup, create_test_context, run_test, sorted_names, CORNWALL_WKT, DEVON_WKT,
};

#[test]
fn test_get_geometries_in_bounding_box() {
    run_test(
        || create_test_context(),
        |ctx| {
            let uk = ctx.layer("uk")?;
            let cornwall = ctx.name("cornwall");
            let devon = ctx.name("devon");
            ctx.gateway().create_geometry(&cornwall, CORNWALL_WKT, &uk)?;
            ctx.gateway().create_geometry(&devon, DEVON_WKT, &uk)?;

            // very roughly, the uk
            let geometries = ctx
                .gateway()
                .find_within_bounding_box(&uk, -10.0, 40.0, 10.0, 80.0)?;

            assert_eq!(geometries.len(), 2);
            assert_eq!(
                sorted_names(geometries.iter().map(|g| g.geometry_name())),
                sorted_names([cornwall.as_str(), devon.as_str()])
            );
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_bounding_box_excludes_distant_geometries() {
    run_test(
        || create_test_context(),
        |ctx| {
            let uk = ctx.layer("uk")?;
            let cornwall = ctx.name("cornwall");
            ctx.gateway().create_geometry(&cornwall, CORNWALL_WKT, &uk)?;
            ctx.gateway()
                .create_point_of_interest(&ctx.name("texas"), &uk, 31.5, -100.1)?;

            let geometries = ctx
                .gateway()
                .find_within_bounding_box(&uk, -10.0, 40.0, 10.0, 80.0)?;
            assert_eq!(geometries.len(), 1);
            assert_eq!(geometries[0].geometry_name(), cornwall);
            assert_eq!(geometries[0].layer_name(), Some(uk.as_str()));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_bounding_box_is_scoped_to_layer() {
    run_test(
        || create_test_context(),
        |ctx| {
            let uk = ctx.layer("uk")?;
            let other = ctx.layer("other")?;
            ctx.gateway().create_geometry(&ctx.name("cornwall"), CORNWALL_WKT, &uk)?;
            ctx.gateway().create_geometry(&ctx.name("devon"), DEVON_WKT, &other)?;

            let geometries = ctx
                .gateway()
                .find_within_bounding_box(&other, -10.0, 40.0, 10.0, 80.0)?;
            assert_eq!(geometries.len(), 1);
            assert_eq!(geometries[0].geometry_name(), ctx.name("devon"));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_partially_overlapping_polygon_is_found() {
    run_test(
        || create_test_context(),
        |ctx| {
            let uk = ctx.layer("uk")?;
            let cornwall = ctx.name("cornwall");
            ctx.gateway().create_geometry(&cornwall, CORNWALL_WKT, &uk)?;

            // covers only the eastern edge of the polygon
            let geometries = ctx
                .gateway()
                .find_within_bounding_box(&uk, -4.5, 50.5, 0.0, 52.0)?;
            assert_eq!(geometries.len(), 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_empty_search() {
    run_test(
        || create_test_context(),
        |ctx| {
            let uk = ctx.layer("uk")?;
            ctx.gateway().create_geometry(&ctx.name("cornwall"), CORNWALL_WKT, &uk)?;

            let geometries = ctx
                .gateway()
                .find_within_bounding_box(&uk, 100.0, -40.0, 120.0, -10.0)?;
            assert!(geometries.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_inverted_bounding_box() {
    run_test(
        || create_test_context(),
        |ctx| {
            let uk = ctx.layer("uk")?;
            let result = ctx
                .gateway()
                .find_within_bounding_box(&uk, 10.0, 40.0, -10.0, 80.0);
            assert!(matches!(result, Err(SpatialError::InvalidBoundingBox(_))));

            let result = ctx
                .gateway()
                .find_within_bounding_box(&uk, f64::NAN, 40.0, 10.0, 80.0);
            assert!(matches!(result, Err(SpatialError::InvalidBoundingBox(_))));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_search_missing_layer() {
    run_test(
        || create_test_context(),
        |ctx| {
            let result = ctx
                .gateway()
                .find_within_bounding_box(&ctx.name("nowhere"), -10.0, 40.0, 10.0, 80.0);
            assert!(matches!(result, Err(SpatialError::Database { .. })));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
