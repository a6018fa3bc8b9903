//! PPE class label set.
//!
//! The model reports classes by index. The order of `PpeClass::ALL` is the
//! index contract with the weights file and must not be reordered.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};

/// Number of classes the PPE model was trained on.
pub const CLASS_COUNT: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PpeClass {
    Hardhat,
    Mask,
    NoHardhat,
    NoMask,
    NoSafetyVest,
    Person,
    SafetyCone,
    SafetyVest,
    Machinery,
    Vehicle,
}

impl PpeClass {
    /// All classes in model index order.
    pub const ALL: [PpeClass; CLASS_COUNT] = [
        PpeClass::Hardhat,
        PpeClass::Mask,
        PpeClass::NoHardhat,
        PpeClass::NoMask,
        PpeClass::NoSafetyVest,
        PpeClass::Person,
        PpeClass::SafetyCone,
        PpeClass::SafetyVest,
        PpeClass::Machinery,
        PpeClass::Vehicle,
    ];

    /// Map a model class id to a label. Unknown ids are an error.
    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| anyhow!("class id {} outside label set of {}", index, CLASS_COUNT))
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Label as the model's dataset spells it.
    pub fn as_str(self) -> &'static str {
        match self {
            PpeClass::Hardhat => "Hardhat",
            PpeClass::Mask => "Mask",
            PpeClass::NoHardhat => "NO-Hardhat",
            PpeClass::NoMask => "NO-Mask",
            PpeClass::NoSafetyVest => "NO-Safety Vest",
            PpeClass::Person => "Person",
            PpeClass::SafetyCone => "Safety Cone",
            PpeClass::SafetyVest => "Safety Vest",
            PpeClass::Machinery => "machinery",
            PpeClass::Vehicle => "vehicle",
        }
    }

    /// True for the "NO-*" classes that flag missing equipment.
    pub fn is_violation(self) -> bool {
        matches!(
            self,
            PpeClass::NoHardhat | PpeClass::NoMask | PpeClass::NoSafetyVest
        )
    }
}

impl fmt::Display for PpeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PpeClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| anyhow!("unknown PPE class label '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_order_matches_model_contract() {
        let names: Vec<&str> = PpeClass::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Hardhat",
                "Mask",
                "NO-Hardhat",
                "NO-Mask",
                "NO-Safety Vest",
                "Person",
                "Safety Cone",
                "Safety Vest",
                "machinery",
                "vehicle",
            ]
        );
        for (i, class) in PpeClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), i);
            assert_eq!(PpeClass::from_index(i).unwrap(), *class);
        }
    }

    #[test]
    fn out_of_range_class_id_is_rejected() {
        assert!(PpeClass::from_index(CLASS_COUNT).is_err());
    }

    #[test]
    fn labels_parse_back() {
        assert_eq!(
            "NO-Safety Vest".parse::<PpeClass>().unwrap(),
            PpeClass::NoSafetyVest
        );
        assert!("hardhat".parse::<PpeClass>().is_err());
    }

    #[test]
    fn only_no_classes_are_violations() {
        let violations: Vec<&str> = PpeClass::ALL
            .iter()
            .filter(|c| c.is_violation())
            .map(|c| c.as_str())
            .collect();
        assert_eq!(violations, vec!["NO-Hardhat", "NO-Mask", "NO-Safety Vest"]);
    }
}
