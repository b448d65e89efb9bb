use graph_spatial::SpatialError;
use graph_spatial_int_test::test_util::{
    cleanup, create_test_context, run_test, CORNWALL_WKT, DEVON_WKT,
};

#[test]
fn test_delete_geometry() {
    run_test(
        || create_test_context(),
        |ctx| {
            let uk = ctx.layer("uk")?;
            let cornwall = ctx.name("cornwall");
            let geometry = ctx.gateway().create_geometry(&cornwall, CORNWALL_WKT, &uk)?;
            assert!(ctx.geometry_exists(&cornwall)?);

            ctx.gateway().delete_geometry(&cornwall, CORNWALL_WKT, &uk)?;

            assert!(!ctx.geometry_exists(&cornwall)?);
            assert!(ctx.fetch_node(geometry.node_id())?.is_none());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_deleted_geometry_leaves_search_results() {
    run_test(
        || create_test_context(),
        |ctx| {
            let uk = ctx.layer("uk")?;
            let cornwall = ctx.name("cornwall");
            let devon = ctx.name("devon");
            ctx.gateway().create_geometry(&cornwall, CORNWALL_WKT, &uk)?;
            ctx.gateway().create_geometry(&devon, DEVON_WKT, &uk)?;

            ctx.gateway().delete_geometry(&cornwall, CORNWALL_WKT, &uk)?;

            let found = ctx
                .gateway()
                .find_within_bounding_box(&uk, -10.0, 40.0, 10.0, 80.0)?;
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].geometry_name(), devon);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_delete_missing_geometry() {
    run_test(
        || create_test_context(),
        |ctx| {
            let uk = ctx.layer("uk")?;
            let result = ctx
                .gateway()
                .delete_geometry(&ctx.name("cornwall"), CORNWALL_WKT, &uk);
            assert!(matches!(result, Err(SpatialError::GeometryNotFound(_))));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_delete_twice() {
    run_test(
        || create_test_context(),
        |ctx| {
            let uk = ctx.layer("uk")?;
            let cornwall = ctx.name("cornwall");
            ctx.gateway().create_geometry(&cornwall, CORNWALL_WKT, &uk)?;

            ctx.gateway().delete_geometry(&cornwall, CORNWALL_WKT, &uk)?;
            let again = ctx.gateway().delete_geometry(&cornwall, CORNWALL_WKT, &uk);
            assert!(again.unwrap_err().is_not_found());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_delete_with_invalid_wkt() {
    run_test(
        || create_test_context(),
        |ctx| {
            let uk = ctx.layer("uk")?;
            let cornwall = ctx.name("cornwall");
            ctx.gateway().create_geometry(&cornwall, CORNWALL_WKT, &uk)?;

            let result = ctx.gateway().delete_geometry(&cornwall, "Shape(1, 234)", &uk);
            assert!(matches!(result, Err(SpatialError::InvalidWkt(_))));
            assert!(ctx.geometry_exists(&cornwall)?);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
