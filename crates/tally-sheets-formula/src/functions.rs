//! Built-in aggregate functions
//!
//! Every built-in takes the flattened numeric arguments of a call and
//! returns a number; an empty argument list yields `0`.

/// Function implementation signature
pub type FunctionImpl = fn(&[f64]) -> f64;

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Implementation
    pub implementation: FunctionImpl,
}

static BUILTINS: &[FunctionDef] = &[
    FunctionDef {
        name: "SUM",
        implementation: fn_sum,
    },
    FunctionDef {
        name: "AVERAGE",
        implementation: fn_average,
    },
    FunctionDef {
        name: "MAX",
        implementation: fn_max,
    },
    FunctionDef {
        name: "MIN",
        implementation: fn_min,
    },
];

/// Look up a built-in function by name (case-insensitive)
pub fn lookup(name: &str) -> Option<&'static FunctionDef> {
    BUILTINS
        .iter()
        .find(|def| def.name.eq_ignore_ascii_case(name))
}

/// Names of all built-in functions
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|def| def.name)
}

/// SUM function
pub fn fn_sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// AVERAGE function
pub fn fn_average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    fn_sum(values) / values.len() as f64
}

/// MAX function
pub fn fn_max(values: &[f64]) -> f64 {
    let mut max: Option<f64> = None;
    for &n in values {
        max = Some(max.map_or(n, |m| m.max(n)));
    }
    max.unwrap_or(0.0)
}

/// MIN function
pub fn fn_min(values: &[f64]) -> f64 {
    let mut min: Option<f64> = None;
    for &n in values {
        min = Some(min.map_or(n, |m| m.min(n)));
    }
    min.unwrap_or(0.0)
}
