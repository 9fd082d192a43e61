// std
use std::sync::Arc;
// pbrt
use rs_mlt::core::error::RenderError;
use rs_mlt::core::film::ImageBuffer;
use rs_mlt::core::geometry::{Point2f, Point2i, Vector2i};
use rs_mlt::core::integrator::Integrator;
use rs_mlt::core::pbrt::{Float, Spectrum};
use rs_mlt::core::scene::Scene;
use rs_mlt::integrators::mlt::config::MLTConfiguration;
use rs_mlt::integrators::mlt::{MLTIntegrator, RenderOutcome};
use rs_mlt::scenes::analytic::{AnalyticScene, Spot};

fn render(scene: AnalyticScene, config: MLTConfiguration, num_threads: usize) -> ImageBuffer {
    let scene: Arc<dyn Scene> = Arc::new(scene);
    let integrator = MLTIntegrator::new(config, num_threads);
    integrator.preprocess(scene.as_ref()).unwrap();
    match integrator.render_image(&scene).unwrap() {
        RenderOutcome::Finished(image) => image,
        RenderOutcome::Cancelled => panic!("render was cancelled"),
    }
}

/// Fraction of the total luminance that lands in the left half.
fn left_fraction(image: &ImageBuffer) -> Float {
    let size: Vector2i = image.size();
    let mut left: f64 = 0.0;
    let mut total: f64 = 0.0;
    for y in 0..size.y {
        for x in 0..size.x {
            let l: f64 = image.get(&Point2i { x, y }).y() as f64;
            total += l;
            if x < size.x / 2 {
                left += l;
            }
        }
    }
    (left / total) as Float
}

#[test]
fn average_matches_closed_form() {
    let scene = AnalyticScene::new(Vector2i::new(16, 16), 128);
    let expected: Float = scene.expected_luminance(1, Some(4));
    let config = MLTConfiguration {
        max_depth: 4,
        luminance_samples: 20_000,
        direct_samples: 64,
        work_units: 4,
        seed: 3,
        ..Default::default()
    };
    let image = render(scene, config, 2);
    let average: Float = image.average_luminance();
    assert!(
        (average - expected).abs() / expected < 0.04,
        "average {} expected {}",
        average,
        expected
    );
}

#[test]
fn chains_follow_the_sensor_gradient() {
    // 0.5 + x integrates to 0.375 of the total over the left half
    let scene = AnalyticScene::new(Vector2i::new(16, 16), 512);
    let config = MLTConfiguration {
        max_depth: 4,
        luminance_samples: 20_000,
        direct_samples: -1,
        separate_direct: false,
        work_units: 8,
        lens_perturbation: true,
        seed: 11,
        ..Default::default()
    };
    let image = render(scene, config, 4);
    let fraction = left_fraction(&image);
    assert!((fraction - 0.375).abs() < 0.03, "left fraction {}", fraction);
}

#[test]
fn all_mutations_together_stay_unbiased() {
    let scene = AnalyticScene::new(Vector2i::new(16, 16), 512).with_albedo(
        Spectrum::new(0.5),
        Spectrum::new(0.9),
        0.5,
    );
    let config = MLTConfiguration {
        max_depth: 5,
        luminance_samples: 20_000,
        direct_samples: -1,
        separate_direct: false,
        work_units: 8,
        lens_perturbation: true,
        caustic_perturbation: true,
        multi_chain_perturbation: true,
        manifold_perturbation: true,
        seed: 5,
        ..Default::default()
    };
    let expected: Float = scene.expected_luminance(1, Some(5));
    let image = render(scene, config, 4);
    let average: Float = image.average_luminance();
    assert!((average - expected).abs() / expected < 0.04);
    let fraction = left_fraction(&image);
    assert!((fraction - 0.375).abs() < 0.03, "left fraction {}", fraction);
}

#[test]
fn same_seed_renders_identical_images() {
    let config = MLTConfiguration {
        max_depth: 3,
        luminance_samples: 5_000,
        direct_samples: 4,
        work_units: 5,
        lens_perturbation: true,
        seed: 42,
        ..Default::default()
    };
    let a = render(AnalyticScene::new(Vector2i::new(12, 8), 32), config.clone(), 3);
    let b = render(AnalyticScene::new(Vector2i::new(12, 8), 32), config, 2);
    assert_eq!(a.pixels(), b.pixels());
}

#[test]
fn black_scene_renders_black() {
    let scene = AnalyticScene::new(Vector2i::new(8, 8), 16).with_emission(Spectrum::new(0.0));
    let config = MLTConfiguration {
        max_depth: 4,
        luminance_samples: 1_000,
        work_units: 2,
        ..Default::default()
    };
    let image = render(scene, config, 2);
    assert!(image.pixels().iter().all(|p| p.is_black()));
}

#[test]
fn direct_only_when_chains_have_nothing_left() {
    // one-edge paths only: everything belongs to the direct pass
    let scene = AnalyticScene::new(Vector2i::new(8, 8), 16);
    let expected: Float = scene.expected_luminance(1, Some(1));
    let config = MLTConfiguration {
        max_depth: 1,
        luminance_samples: 1_000,
        direct_samples: 256,
        ..Default::default()
    };
    let image = render(scene, config, 2);
    let average: Float = image.average_luminance();
    assert!((average - expected).abs() / expected < 0.05);
}

#[test]
fn two_stage_render_stays_unbiased() {
    let scene = AnalyticScene::new(Vector2i::new(32, 16), 64);
    let expected: Float = scene.expected_luminance(1, Some(4));
    let config = MLTConfiguration {
        max_depth: 4,
        two_stage: true,
        first_stage_size_reduction: 4,
        luminance_samples: 20_000,
        direct_samples: 32,
        work_units: 4,
        seed: 9,
        ..Default::default()
    };
    let image = render(scene, config, 2);
    assert_eq!(image.size(), Vector2i::new(32, 16));
    let average: Float = image.average_luminance();
    assert!((average - expected).abs() / expected < 0.05);
    let fraction = left_fraction(&image);
    assert!((fraction - 0.375).abs() < 0.04, "left fraction {}", fraction);
}

#[test]
fn zero_direct_samples_drop_short_paths() {
    // chains start at three edges and nothing renders the shorter ones
    let scene = AnalyticScene::new(Vector2i::new(16, 16), 128);
    let expected: Float = scene.expected_luminance(3, Some(4));
    assert!((expected - 0.5207).abs() < 1.0e-3);
    let config = MLTConfiguration {
        max_depth: 4,
        luminance_samples: 20_000,
        direct_samples: 0,
        separate_direct: true,
        work_units: 4,
        seed: 5,
        ..Default::default()
    };
    let image = render(scene, config, 2);
    let average: Float = image.average_luminance();
    assert!(
        (average - expected).abs() / expected < 0.04,
        "average {} expected {}",
        average,
        expected
    );
}

#[test]
fn two_stage_render_with_bright_spot_stays_unbiased() {
    let scene = AnalyticScene::new(Vector2i::new(32, 32), 64).with_spot(Spot {
        center: Point2f { x: 0.25, y: 0.5 },
        radius: 0.15,
        gain: 6.0,
    });
    let expected: Float = scene.expected_luminance(1, Some(3));
    let config = MLTConfiguration {
        max_depth: 3,
        two_stage: true,
        first_stage_size_reduction: 4,
        luminance_samples: 20_000,
        direct_samples: 32,
        work_units: 4,
        seed: 13,
        ..Default::default()
    };
    let image = render(scene, config, 2);
    let average: Float = image.average_luminance();
    assert!(
        (average - expected).abs() / expected < 0.05,
        "average {} expected {}",
        average,
        expected
    );
}

#[test]
fn invalid_configuration_fails_render_without_panic() {
    let scene: Arc<dyn Scene> = Arc::new(AnalyticScene::new(Vector2i::new(16, 16), 4));
    let config = MLTConfiguration {
        two_stage: true,
        first_stage_size_reduction: 0,
        luminance_samples: 100,
        ..Default::default()
    };
    let integrator = MLTIntegrator::new(config, 1);
    assert!(!integrator.render(&scene));
    assert!(integrator.take_image().is_none());
}

#[test]
fn render_without_mutations_reports_error() {
    let scene: Arc<dyn Scene> = Arc::new(AnalyticScene::new(Vector2i::new(8, 8), 4));
    let config = MLTConfiguration {
        bidirectional_mutation: false,
        luminance_samples: 100,
        ..Default::default()
    };
    let integrator = MLTIntegrator::new(config, 1);
    match integrator.render_image(&scene) {
        Err(RenderError::NoMutationStrategy) => {}
        other => panic!("unexpected outcome {:?}", other.map(|_| ())),
    }
}

#[test]
fn two_stage_fails_without_resizable_scene() {
    let scene: Arc<dyn Scene> = Arc::new(AnalyticScene::new(Vector2i::new(16, 16), 4).fixed_size());
    let config = MLTConfiguration {
        two_stage: true,
        first_stage_size_reduction: 4,
        luminance_samples: 100,
        ..Default::default()
    };
    let integrator = MLTIntegrator::new(config, 1);
    assert!(integrator.render_image(&scene).is_err());
    assert!(!integrator.render(&scene));
    assert!(integrator.take_image().is_none());
}

#[test]
fn finished_render_stores_image() {
    let scene: Arc<dyn Scene> = Arc::new(AnalyticScene::new(Vector2i::new(8, 4), 8));
    let config = MLTConfiguration {
        max_depth: 3,
        luminance_samples: 1_000,
        ..Default::default()
    };
    let integrator = MLTIntegrator::new(config, 1);
    assert!(integrator.render(&scene));
    let image = integrator.take_image().unwrap();
    assert_eq!(image.size(), Vector2i::new(8, 4));
    assert!(integrator.take_image().is_none());
}
