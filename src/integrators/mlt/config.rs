//! Stores all configuration parameters of the MLT integrator.

// std
use std::io::{Read, Write};
use std::sync::Arc;
// others
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::info;
// pbrt
use crate::core::error::{RenderError, Result};
use crate::core::geometry::Vector2i;
use crate::core::paramset::ParamSet;
use crate::core::pbrt::{round_up_pow2_32, Float};
use crate::integrators::mlt::importance::ImportanceMap;
use crate::integrators::mlt::path::PathLengths;

/// Mutations per work unit the automatic work split aims for.
pub const MUTATIONS_PER_WORK_UNIT: u64 = 200_000;

#[derive(Debug, Clone, PartialEq)]
pub struct MLTConfiguration {
    /// Longest path (in edges) to be generated, -1 for unbounded.
    pub max_depth: i32,
    pub two_stage: bool,
    pub first_stage_size_reduction: i32,
    /// Set while rendering the reduced first stage.
    pub first_stage: bool,
    pub luminance_samples: u64,
    /// < 0: the chains handle direct light; 0: no direct light; > 0:
    /// samples per pixel of the separate direct pass.
    pub direct_samples: i32,
    pub separate_direct: bool,
    /// Number of chains; -1 derives it from the image size.
    pub work_units: i64,
    pub bidirectional_mutation: bool,
    pub lens_perturbation: bool,
    pub caustic_perturbation: bool,
    pub multi_chain_perturbation: bool,
    pub manifold_perturbation: bool,
    pub prob_factor: Float,
    /// Seconds, 0 = unlimited.
    pub timeout: u32,
    pub seed: u64,
    // filled in at render time
    /// Normalization of the chain target; the average image luminance
    /// unless an importance map is set.
    pub luminance: Float,
    pub n_mutations: u64,
    pub importance_map: Option<Arc<ImportanceMap>>,
}

impl Default for MLTConfiguration {
    fn default() -> Self {
        MLTConfiguration {
            max_depth: -1,
            two_stage: false,
            first_stage_size_reduction: 16,
            first_stage: false,
            luminance_samples: 100_000,
            direct_samples: 16,
            separate_direct: true,
            work_units: -1,
            bidirectional_mutation: true,
            lens_perturbation: false,
            caustic_perturbation: false,
            multi_chain_perturbation: false,
            manifold_perturbation: false,
            prob_factor: 50.0 as Float,
            timeout: 0,
            seed: 0,
            luminance: 0.0 as Float,
            n_mutations: 0,
            importance_map: None,
        }
    }
}

impl MLTConfiguration {
    pub fn from_params(params: &ParamSet) -> Result<Self> {
        let mut direct_samples: i32 = params.find_one_int("directSamples", 16);
        if direct_samples > 0 {
            direct_samples = round_up_pow2_32(direct_samples);
        }
        let luminance_samples: i32 = params.find_one_int("luminanceSamples", 100_000);
        if luminance_samples <= 0 {
            return Err(RenderError::invalid(
                "luminanceSamples",
                format!("must be positive (got {})", luminance_samples),
            ));
        }
        let seed: i32 = params.find_one_int("seed", 0);
        if seed < 0 {
            return Err(RenderError::invalid(
                "seed",
                format!("must not be negative (got {})", seed),
            ));
        }
        let config = MLTConfiguration {
            max_depth: params.find_one_int("maxDepth", -1),
            two_stage: params.find_one_bool("twoStage", false),
            first_stage_size_reduction: params.find_one_int("firstStageSizeReduction", 16),
            first_stage: params.find_one_bool("firstStage", false),
            luminance_samples: luminance_samples as u64,
            direct_samples,
            separate_direct: direct_samples >= 0,
            work_units: params.find_one_int("workUnits", -1) as i64,
            bidirectional_mutation: params.find_one_bool("bidirectionalMutation", true),
            lens_perturbation: params.find_one_bool("lensPerturbation", false),
            caustic_perturbation: params.find_one_bool("causticPerturbation", false),
            multi_chain_perturbation: params.find_one_bool("multiChainPerturbation", false),
            manifold_perturbation: params.find_one_bool("manifoldPerturbation", false),
            prob_factor: params.find_one_float("probFactor", 50.0 as Float),
            timeout: params.find_one_int("timeout", 0).max(0) as u32,
            seed: seed as u64,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> Result<()> {
        if !self.any_mutation_enabled() {
            return Err(RenderError::NoMutationStrategy);
        }
        if self.max_depth < -1 {
            return Err(RenderError::invalid(
                "maxDepth",
                format!("must be -1 or non-negative (got {})", self.max_depth),
            ));
        }
        if self.first_stage_size_reduction <= 0 {
            return Err(RenderError::invalid(
                "firstStageSizeReduction",
                format!("must be positive (got {})", self.first_stage_size_reduction),
            ));
        }
        if self.luminance_samples == 0 {
            return Err(RenderError::invalid("luminanceSamples", "must be positive"));
        }
        if !(self.prob_factor >= 0.0 as Float) || !self.prob_factor.is_finite() {
            return Err(RenderError::invalid(
                "probFactor",
                format!("must be a non-negative number (got {})", self.prob_factor),
            ));
        }
        if self.work_units == 0 || self.work_units < -1 {
            return Err(RenderError::invalid(
                "workUnits",
                format!("must be -1 or positive (got {})", self.work_units),
            ));
        }
        Ok(())
    }
    pub fn any_mutation_enabled(&self) -> bool {
        self.bidirectional_mutation
            || self.lens_perturbation
            || self.caustic_perturbation
            || self.multi_chain_perturbation
            || self.manifold_perturbation
    }
    /// Number of work units and mutations per unit for an image of
    /// `crop_size` pixels at `sample_count` samples per pixel.
    pub fn work_distribution(&self, crop_size: Vector2i, sample_count: u32) -> (u64, u64) {
        let total: u64 = crop_size.area() as u64 * sample_count as u64;
        let work_units: u64 = if self.work_units > 0 {
            self.work_units as u64
        } else {
            ((total + MUTATIONS_PER_WORK_UNIT - 1) / MUTATIONS_PER_WORK_UNIT).max(1)
        };
        (work_units, total / work_units)
    }
    /// Shortest and longest path, counted in vertices, the chains are
    /// responsible for. Direct paths (one or two edges) are left out
    /// when a separate direct pass takes care of them.
    pub fn path_lengths(&self) -> PathLengths {
        let min_vertices: usize = if self.separate_direct { 4 } else { 2 };
        let max_vertices: Option<usize> = if self.max_depth < 0 {
            None
        } else {
            Some(self.max_depth as usize + 1)
        };
        PathLengths::new(min_vertices, max_vertices)
    }
    pub fn dump(&self) {
        info!("MLT configuration:");
        info!("   Maximum path depth          : {}", self.max_depth);
        info!("   Two-stage MLT               : {}", yes_no(self.two_stage));
        if self.two_stage {
            info!(
                "   First-stage size reduction  : {}",
                self.first_stage_size_reduction
            );
        }
        info!("   Luminance samples           : {}", self.luminance_samples);
        info!(
            "   Direct samples              : {}",
            if self.separate_direct {
                format!("{}", self.direct_samples)
            } else {
                "none (MLT handles direct light)".to_string()
            }
        );
        info!("   Mutations per work unit     : {}", self.n_mutations);
        info!("   Work units                  : {}", self.work_units);
        info!(
            "   Bidirectional mutation      : {}",
            yes_no(self.bidirectional_mutation)
        );
        info!(
            "   Lens perturbation           : {}",
            yes_no(self.lens_perturbation)
        );
        info!(
            "   Caustic perturbation        : {}",
            yes_no(self.caustic_perturbation)
        );
        info!(
            "   Multi-chain perturbation    : {}",
            yes_no(self.multi_chain_perturbation)
        );
        info!(
            "   Manifold perturbation       : {}",
            yes_no(self.manifold_perturbation)
        );
        info!("   Probability factor          : {}", self.prob_factor);
        info!(
            "   Timeout                     : {}",
            if self.timeout == 0 {
                "none".to_string()
            } else {
                format!("{} s", self.timeout)
            }
        );
        info!("   Seed                        : {}", self.seed);
        info!("   Luminance estimate          : {}", self.luminance);
        if let Some(ref map) = self.importance_map {
            let size: Vector2i = map.size();
            info!("   Importance map              : {}x{}", size.x, size.y);
        }
    }
    pub fn serialize<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_i32::<LittleEndian>(self.max_depth)?;
        w.write_u8(self.two_stage as u8)?;
        w.write_i32::<LittleEndian>(self.first_stage_size_reduction)?;
        w.write_u8(self.first_stage as u8)?;
        w.write_u64::<LittleEndian>(self.luminance_samples)?;
        w.write_i32::<LittleEndian>(self.direct_samples)?;
        w.write_u8(self.separate_direct as u8)?;
        w.write_i64::<LittleEndian>(self.work_units)?;
        w.write_u8(self.bidirectional_mutation as u8)?;
        w.write_u8(self.lens_perturbation as u8)?;
        w.write_u8(self.caustic_perturbation as u8)?;
        w.write_u8(self.multi_chain_perturbation as u8)?;
        w.write_u8(self.manifold_perturbation as u8)?;
        w.write_f32::<LittleEndian>(self.prob_factor)?;
        w.write_u32::<LittleEndian>(self.timeout)?;
        w.write_u64::<LittleEndian>(self.seed)?;
        w.write_f32::<LittleEndian>(self.luminance)?;
        w.write_u64::<LittleEndian>(self.n_mutations)?;
        match self.importance_map {
            Some(ref map) => {
                w.write_u8(1)?;
                let size: Vector2i = map.size();
                w.write_u32::<LittleEndian>(size.x as u32)?;
                w.write_u32::<LittleEndian>(size.y as u32)?;
                for v in map.values() {
                    w.write_f32::<LittleEndian>(*v)?;
                }
            }
            None => w.write_u8(0)?,
        }
        Ok(())
    }
    pub fn deserialize<R: Read>(r: &mut R) -> Result<Self> {
        read_config(r).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                RenderError::Truncated(e)
            } else {
                RenderError::Io(e)
            }
        })?
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn read_bool<R: Read>(r: &mut R) -> std::io::Result<bool> {
    Ok(r.read_u8()? != 0)
}

// the outer Result carries stream errors, the inner one malformed content
fn read_config<R: Read>(r: &mut R) -> std::io::Result<Result<MLTConfiguration>> {
    let mut config = MLTConfiguration {
        max_depth: r.read_i32::<LittleEndian>()?,
        two_stage: read_bool(r)?,
        first_stage_size_reduction: r.read_i32::<LittleEndian>()?,
        first_stage: read_bool(r)?,
        luminance_samples: r.read_u64::<LittleEndian>()?,
        direct_samples: r.read_i32::<LittleEndian>()?,
        separate_direct: read_bool(r)?,
        work_units: r.read_i64::<LittleEndian>()?,
        bidirectional_mutation: read_bool(r)?,
        lens_perturbation: read_bool(r)?,
        caustic_perturbation: read_bool(r)?,
        multi_chain_perturbation: read_bool(r)?,
        manifold_perturbation: read_bool(r)?,
        prob_factor: r.read_f32::<LittleEndian>()?,
        timeout: r.read_u32::<LittleEndian>()?,
        seed: r.read_u64::<LittleEndian>()?,
        luminance: r.read_f32::<LittleEndian>()?,
        n_mutations: r.read_u64::<LittleEndian>()?,
        importance_map: None,
    };
    if read_bool(r)? {
        let width: u32 = r.read_u32::<LittleEndian>()?;
        let height: u32 = r.read_u32::<LittleEndian>()?;
        let n: usize = width as usize * height as usize;
        let mut values: Vec<Float> = Vec::with_capacity(n.min(1 << 24));
        for _ in 0..n {
            values.push(r.read_f32::<LittleEndian>()?);
        }
        match ImportanceMap::new(Vector2i::new(width as i32, height as i32), values) {
            Some(map) => config.importance_map = Some(Arc::new(map)),
            None => {
                return Ok(Err(RenderError::invalid(
                    "importanceMap",
                    "malformed importance map",
                )))
            }
        }
    }
    Ok(Ok(config))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_follow_parameter_table() {
        let config = MLTConfiguration::from_params(&ParamSet::default()).unwrap();
        assert_eq!(config.max_depth, -1);
        assert!(!config.two_stage);
        assert_eq!(config.first_stage_size_reduction, 16);
        assert_eq!(config.luminance_samples, 100_000);
        assert_eq!(config.direct_samples, 16);
        assert!(config.separate_direct);
        assert_eq!(config.work_units, -1);
        assert!(config.bidirectional_mutation);
        assert!(!config.lens_perturbation);
        assert_eq!(config.prob_factor, 50.0);
        assert_eq!(config.timeout, 0);
    }

    #[test]
    fn direct_samples_round_up_to_power_of_two() {
        let mut params = ParamSet::default();
        params.add_int("directSamples".to_string(), 12);
        let config = MLTConfiguration::from_params(&params).unwrap();
        assert_eq!(config.direct_samples, 16);
        let mut params = ParamSet::default();
        params.add_int("directSamples".to_string(), -1);
        let config = MLTConfiguration::from_params(&params).unwrap();
        assert_eq!(config.direct_samples, -1);
        assert!(!config.separate_direct);
    }

    #[test]
    fn no_strategy_is_a_configuration_error() {
        let mut params = ParamSet::default();
        params.add_bool("bidirectionalMutation".to_string(), false);
        match MLTConfiguration::from_params(&params) {
            Err(RenderError::NoMutationStrategy) => {}
            other => panic!("unexpected result {:?}", other),
        }
        params.add_bool("lensPerturbation".to_string(), true);
        assert!(MLTConfiguration::from_params(&params).is_ok());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut params = ParamSet::default();
        params.add_int("firstStageSizeReduction".to_string(), 0);
        assert!(MLTConfiguration::from_params(&params).is_err());
        let mut params = ParamSet::default();
        params.add_int("luminanceSamples".to_string(), 0);
        assert!(MLTConfiguration::from_params(&params).is_err());
        let mut params = ParamSet::default();
        params.add_float("probFactor".to_string(), -1.0);
        assert!(MLTConfiguration::from_params(&params).is_err());
    }

    #[test]
    fn automatic_work_distribution() {
        let config = MLTConfiguration::default();
        assert_eq!(
            config.work_distribution(Vector2i::new(100, 100), 16),
            (1, 160_000)
        );
        assert_eq!(
            config.work_distribution(Vector2i::new(512, 512), 32),
            (42, 512 * 512 * 32 / 42)
        );
        let fixed = MLTConfiguration {
            work_units: 8,
            ..Default::default()
        };
        assert_eq!(fixed.work_distribution(Vector2i::new(10, 10), 4), (8, 50));
    }

    #[test]
    fn vertex_range_follows_direct_split() {
        let config = MLTConfiguration {
            max_depth: 5,
            ..Default::default()
        };
        assert_eq!(config.path_lengths(), PathLengths::new(4, Some(6)));
        let config = MLTConfiguration {
            separate_direct: false,
            direct_samples: -1,
            ..Default::default()
        };
        assert_eq!(config.path_lengths(), PathLengths::new(2, None));
    }

    #[test]
    fn serialization_round_trip() {
        let config = MLTConfiguration {
            max_depth: 7,
            two_stage: true,
            first_stage_size_reduction: 8,
            lens_perturbation: true,
            manifold_perturbation: true,
            prob_factor: 12.5,
            timeout: 30,
            seed: 99,
            luminance: 0.375,
            n_mutations: 123_456,
            work_units: 3,
            importance_map: ImportanceMap::new(Vector2i::new(2, 1), vec![0.5, 1.5]).map(Arc::new),
            ..Default::default()
        };
        let mut bytes: Vec<u8> = Vec::new();
        config.serialize(&mut bytes).unwrap();
        let restored = MLTConfiguration::deserialize(&mut bytes.as_slice()).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn field_order_is_fixed() {
        let config = MLTConfiguration {
            max_depth: 3,
            ..Default::default()
        };
        let mut bytes: Vec<u8> = Vec::new();
        config.serialize(&mut bytes).unwrap();
        assert_eq!(&bytes[0..4], &[3, 0, 0, 0]);
        // two_stage follows max_depth
        assert_eq!(bytes[4], 0);
        assert_eq!(&bytes[5..9], &[16, 0, 0, 0]);
        assert_eq!(*bytes.last().unwrap(), 0);
    }

    #[test]
    fn truncated_stream_is_reported() {
        let mut bytes: Vec<u8> = Vec::new();
        MLTConfiguration::default().serialize(&mut bytes).unwrap();
        bytes.truncate(bytes.len() - 5);
        match MLTConfiguration::deserialize(&mut bytes.as_slice()) {
            Err(RenderError::Truncated(_)) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }
}
