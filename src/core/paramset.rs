//! Bundle up parameters and their values in a generic way.

// std
use std::cell::Cell;
use std::str::FromStr;
// others
use log::warn;
// pbrt
use crate::core::error::{RenderError, Result};
use crate::core::pbrt::Float;

// see paramset.h

#[derive(Debug, Clone)]
pub struct ParamSetItem<T> {
    pub name: String,
    pub values: Vec<T>,
    pub n_values: usize,
    pub looked_up: Cell<bool>, // false
}

impl<T> ParamSetItem<T> {
    fn new(name: String, value: T) -> Self {
        ParamSetItem {
            name,
            values: vec![value],
            n_values: 1_usize,
            looked_up: Cell::new(false),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ParamSet {
    pub key_word: String,
    pub name: String,
    pub bools: Vec<ParamSetItem<bool>>,
    pub ints: Vec<ParamSetItem<i32>>,
    pub floats: Vec<ParamSetItem<Float>>,
    pub strings: Vec<ParamSetItem<String>>,
}

fn lookup_one<T: Clone>(items: &[ParamSetItem<T>], name: &str) -> Option<T> {
    for v in items {
        if v.name == name && v.n_values == 1 {
            v.looked_up.set(true);
            return Some(v.values[0].clone());
        }
    }
    None
}

impl ParamSet {
    pub fn new(key_word: &str, name: &str) -> Self {
        ParamSet {
            key_word: key_word.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }
    // later additions replace earlier ones with the same name
    pub fn add_bool(&mut self, name: String, value: bool) {
        self.erase(&name);
        self.bools.push(ParamSetItem::new(name, value));
    }
    pub fn add_int(&mut self, name: String, value: i32) {
        self.erase(&name);
        self.ints.push(ParamSetItem::new(name, value));
    }
    pub fn add_float(&mut self, name: String, value: Float) {
        self.erase(&name);
        self.floats.push(ParamSetItem::new(name, value));
    }
    pub fn add_string(&mut self, name: String, value: String) {
        self.erase(&name);
        self.strings.push(ParamSetItem::new(name, value));
    }
    fn erase(&mut self, name: &str) {
        self.bools.retain(|v| v.name != name);
        self.ints.retain(|v| v.name != name);
        self.floats.retain(|v| v.name != name);
        self.strings.retain(|v| v.name != name);
    }
    /// Parse a `name=value` assignment, inferring the type from the
    /// value: `true`/`false`, integer, float, otherwise string.
    pub fn add_assignment(&mut self, assignment: &str) -> Result<()> {
        let mut parts = assignment.splitn(2, '=');
        let name: &str = parts.next().unwrap_or("").trim();
        let value: &str = match parts.next() {
            Some(v) => v.trim(),
            None => return Err(RenderError::invalid(name, "expected name=value")),
        };
        if name.is_empty() {
            return Err(RenderError::invalid(assignment, "missing parameter name"));
        }
        if value == "true" || value == "false" {
            self.add_bool(name.to_string(), value == "true");
        } else if let Ok(i) = i32::from_str(value) {
            self.add_int(name.to_string(), i);
        } else if let Ok(f) = Float::from_str(value) {
            self.add_float(name.to_string(), f);
        } else {
            self.add_string(name.to_string(), value.to_string());
        }
        Ok(())
    }
    pub fn find_one_bool(&self, name: &str, d: bool) -> bool {
        lookup_one(&self.bools, name).unwrap_or(d)
    }
    pub fn find_one_int(&self, name: &str, d: i32) -> i32 {
        lookup_one(&self.ints, name).unwrap_or(d)
    }
    /// Integers written without a decimal point are accepted as floats.
    pub fn find_one_float(&self, name: &str, d: Float) -> Float {
        match lookup_one(&self.floats, name) {
            Some(f) => f,
            None => lookup_one(&self.ints, name).map(|i| i as Float).unwrap_or(d),
        }
    }
    pub fn find_one_string(&self, name: &str, d: String) -> String {
        lookup_one(&self.strings, name).unwrap_or(d)
    }
    /// Warn about parameters nobody asked for (usually typos).
    pub fn report_unused(&self) -> usize {
        let mut unused: usize = 0;
        let names = self
            .bools
            .iter()
            .filter(|v| !v.looked_up.get())
            .map(|v| &v.name)
            .chain(self.ints.iter().filter(|v| !v.looked_up.get()).map(|v| &v.name))
            .chain(self.floats.iter().filter(|v| !v.looked_up.get()).map(|v| &v.name))
            .chain(self.strings.iter().filter(|v| !v.looked_up.get()).map(|v| &v.name));
        for name in names {
            warn!("{:?}: parameter {:?} not used", self.key_word, name);
            unused += 1;
        }
        unused
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn assignments_infer_types() {
        let mut ps = ParamSet::new("Integrator", "mlt");
        ps.add_assignment("twoStage=true").unwrap();
        ps.add_assignment("maxDepth=5").unwrap();
        ps.add_assignment("probFactor=12.5").unwrap();
        ps.add_assignment("sampler=independent").unwrap();
        assert!(ps.find_one_bool("twoStage", false));
        assert_eq!(ps.find_one_int("maxDepth", -1), 5);
        assert_eq!(ps.find_one_float("probFactor", 50.0), 12.5);
        assert_eq!(ps.find_one_string("sampler", String::new()), "independent");
        assert!(ps.add_assignment("oops").is_err());
    }

    #[test]
    fn integer_accepted_as_float() {
        let mut ps = ParamSet::default();
        ps.add_int("probFactor".to_string(), 10);
        assert_eq!(ps.find_one_float("probFactor", 50.0), 10.0);
        assert_eq!(ps.find_one_float("missing", 2.0), 2.0);
    }

    #[test]
    fn unused_parameters_are_reported() {
        let mut ps = ParamSet::default();
        ps.add_int("maxDepth".to_string(), 3);
        ps.add_int("maxDpeth".to_string(), 3);
        ps.find_one_int("maxDepth", -1);
        assert_eq!(ps.report_unused(), 1);
    }

    #[test]
    fn later_assignment_wins() {
        let mut ps = ParamSet::default();
        ps.add_assignment("workUnits=4").unwrap();
        ps.add_assignment("workUnits=8").unwrap();
        assert_eq!(ps.find_one_int("workUnits", -1), 8);
    }
}
