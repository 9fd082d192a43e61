// std
use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, SeekFrom};
use std::sync::Arc;
// pbrt
use rs_mlt::core::error::RenderError;
use rs_mlt::core::film::ImageBuffer;
use rs_mlt::core::geometry::{Point2i, Vector2i};
use rs_mlt::core::integrator::Integrator;
use rs_mlt::core::paramset::ParamSet;
use rs_mlt::core::pbrt::Spectrum;
use rs_mlt::core::sampler::SamplerKind;
use rs_mlt::integrators::mlt::config::MLTConfiguration;
use rs_mlt::integrators::mlt::importance::ImportanceMap;
use rs_mlt::integrators::mlt::MLTIntegrator;
use rs_mlt::scenes::analytic::AnalyticScene;

fn params(assignments: &[&str]) -> ParamSet {
    let mut params = ParamSet::new("Integrator", "mlt");
    for a in assignments {
        params.add_assignment(a).unwrap();
    }
    params
}

#[test]
fn preprocess_rejects_subsurface_integrators() {
    let integrator = MLTIntegrator::new(MLTConfiguration::default(), 1);
    let scene = AnalyticScene::new(Vector2i::new(4, 4), 1).with_subsurface_integrators(2);
    match integrator.preprocess(&scene) {
        Err(RenderError::SubsurfaceIntegrators(2)) => {}
        other => panic!("unexpected {:?}", other.err()),
    }
}

#[test]
fn preprocess_rejects_other_samplers() {
    let integrator = MLTIntegrator::new(MLTConfiguration::default(), 1);
    for kind in [SamplerKind::Stratified, SamplerKind::Halton, SamplerKind::Sobol].iter() {
        let scene = AnalyticScene::new(Vector2i::new(4, 4), 1).with_sampler(*kind);
        assert!(matches!(
            integrator.preprocess(&scene),
            Err(RenderError::UnsupportedSampler(_))
        ));
    }
    let scene = AnalyticScene::new(Vector2i::new(4, 4), 1);
    assert!(integrator.preprocess(&scene).is_ok());
}

#[test]
fn preprocess_requires_a_mutation() {
    let config = MLTConfiguration {
        bidirectional_mutation: false,
        ..Default::default()
    };
    let integrator = MLTIntegrator::new(config, 1);
    let scene = AnalyticScene::new(Vector2i::new(4, 4), 1);
    assert!(matches!(
        integrator.preprocess(&scene),
        Err(RenderError::NoMutationStrategy)
    ));
}

#[test]
fn create_reads_parameters() {
    let params = params(&[
        "maxDepth=7",
        "directSamples=20",
        "lensPerturbation=true",
        "probFactor=8",
        "workUnits=3",
        "seed=12",
    ]);
    let integrator = MLTIntegrator::create(&params, 1).unwrap();
    let config = integrator.config();
    assert_eq!(config.max_depth, 7);
    assert_eq!(config.direct_samples, 32);
    assert!(config.separate_direct);
    assert!(config.lens_perturbation);
    assert_eq!(config.prob_factor, 8.0);
    assert_eq!(config.work_units, 3);
    assert_eq!(config.seed, 12);
    assert_eq!(params.report_unused(), 0);
    assert!(MLTIntegrator::create(&self::params(&["bidirectionalMutation=false"]), 1).is_err());
    assert!(MLTIntegrator::create(&self::params(&["workUnits=0"]), 1).is_err());
}

#[test]
fn work_units_follow_image_size() {
    let config = MLTConfiguration::default();
    assert_eq!(config.work_distribution(Vector2i::new(100, 100), 16), (1, 160_000));
    assert_eq!(config.work_distribution(Vector2i::new(256, 256), 64), (21, 199_728));
    let fixed = MLTConfiguration {
        work_units: 8,
        ..Default::default()
    };
    assert_eq!(fixed.work_distribution(Vector2i::new(100, 100), 16), (8, 20_000));
}

#[test]
fn configuration_survives_a_file() {
    let mut image = ImageBuffer::new(Vector2i::new(4, 2));
    image.put(&Point2i { x: 1, y: 1 }, &Spectrum::new(3.0));
    let config = MLTConfiguration {
        max_depth: 9,
        two_stage: true,
        first_stage_size_reduction: 8,
        luminance_samples: 12_345,
        direct_samples: 64,
        work_units: 6,
        caustic_perturbation: true,
        manifold_perturbation: true,
        prob_factor: 12.5,
        timeout: 30,
        seed: u64::max_value(),
        luminance: 0.625,
        n_mutations: 1 << 40,
        importance_map: Some(Arc::new(ImportanceMap::from_image(&image))),
        ..Default::default()
    };
    let mut file: File = tempfile::tempfile().unwrap();
    {
        let mut writer = BufWriter::new(&mut file);
        config.serialize(&mut writer).unwrap();
    }
    file.seek(SeekFrom::Start(0)).unwrap();
    let mut reader = BufReader::new(&mut file);
    let restored = MLTConfiguration::deserialize(&mut reader).unwrap();
    assert_eq!(restored, config);
}
