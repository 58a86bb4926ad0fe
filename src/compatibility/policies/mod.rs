mod inheritance_policy;

pub use inheritance_policy::{
    InheritancePolicy, DEFAULT_INHERITANCE_THRESHOLD, INHERITANCE_CONFIDENCE_FACTOR,
};
