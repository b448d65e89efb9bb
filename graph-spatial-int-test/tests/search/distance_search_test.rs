use graph_spatial::SpatialError;
use graph_spatial_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_find_within_distance_closest_first() {
    run_test(
        || create_test_context(),
        |ctx| {
            let uk = ctx.layer("uk")?;
            let gateway = ctx.gateway();
            gateway.create_point_of_interest(&ctx.name("bristol"), &uk, 51.454513, -2.58791)?;
            gateway.create_point_of_interest(&ctx.name("stonehenge"), &uk, 51.178882, -1.826215)?;
            gateway.create_point_of_interest(&ctx.name("london"), &uk, 51.528453, -0.104489)?;

            let found = gateway.find_within_distance(&uk, 51.178882, -1.826215, 100.0)?;
            let names: Vec<&str> = found.iter().map(|(g, _)| g.geometry_name()).collect();
            assert_eq!(names, vec![ctx.name("stonehenge"), ctx.name("bristol")]);

            let (_, to_stonehenge) = &found[0];
            let (_, to_bristol) = &found[1];
            assert!(*to_stonehenge < 0.01, "distance to itself was {}", to_stonehenge);
            assert!(*to_bristol > 50.0 && *to_bristol < 70.0, "bristol was {} km away", to_bristol);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_within_distance_nothing_near() {
    run_test(
        || create_test_context(),
        |ctx| {
            let uk = ctx.layer("uk")?;
            ctx.gateway()
                .create_point_of_interest(&ctx.name("bristol"), &uk, 51.454513, -2.58791)?;

            let found = ctx.gateway().find_within_distance(&uk, 48.858370, 2.294481, 10.0)?;
            assert!(found.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_within_invalid_distance() {
    run_test(
        || create_test_context(),
        |ctx| {
            let uk = ctx.layer("uk")?;
            assert!(matches!(
                ctx.gateway().find_within_distance(&uk, 51.0, 0.0, -5.0),
                Err(SpatialError::InvalidDistance(_))
            ));
            assert!(matches!(
                ctx.gateway().find_within_distance(&uk, 51.0, 0.0, f64::INFINITY),
                Err(SpatialError::InvalidDistance(_))
            ));
            assert!(matches!(
                ctx.gateway().find_within_distance(&uk, 100.0, 0.0, 5.0),
                Err(SpatialError::InvalidWkt(_))
            ));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
