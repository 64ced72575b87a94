//! Field layout inspection
//!
//! The first file of a run serves as a template: its variable names,
//! dimension shapes and attributes decide what the twelve monthly buckets look
//! like and what the output file will contain.

use crate::errors::{Result, RomsMonthlyError};
use crate::field::{should_drop_auxiliary, ReducedField, ReducedVariable, TimeIndexedField, AUXILIARY_VARIABLE};
use ndarray::{ArrayD, IxDyn};
use netcdf::{AttributeValue, File, Variable};

/// Information about a dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionInfo {
    pub name: String,
    pub length: usize,
    pub is_unlimited: bool,
}

/// How stored values map to physical values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueDecoding {
    pub fill_value: Option<f64>,
    pub missing_value: Option<f64>,
    pub scale_factor: f64,
    pub add_offset: f64,
}

impl Default for ValueDecoding {
    fn default() -> Self {
        Self {
            fill_value: None,
            missing_value: None,
            scale_factor: 1.0,
            add_offset: 0.0,
        }
    }
}

impl ValueDecoding {
    /// Reads `_FillValue`, `missing_value`, `scale_factor` and `add_offset`.
    #[must_use]
    pub fn from_attributes(attributes: &[(String, AttributeValue)]) -> Self {
        let lookup = |name: &str| {
            attributes
                .iter()
                .find(|(key, _)| key == name)
                .and_then(|(_, value)| attribute_as_f64(value))
        };
        Self {
            fill_value: lookup("_FillValue"),
            missing_value: lookup("missing_value"),
            scale_factor: lookup("scale_factor").unwrap_or(1.0),
            add_offset: lookup("add_offset").unwrap_or(0.0),
        }
    }

    /// Turns raw values into physical ones, with NaN for missing entries.
    pub fn apply(&self, values: &mut [f64]) {
        for value in values.iter_mut() {
            if Some(*value) == self.fill_value || Some(*value) == self.missing_value {
                *value = f64::NAN;
            } else {
                *value = *value * self.scale_factor + self.add_offset;
            }
        }
    }
}

/// Attributes that only describe the stored encoding and are not copied to
/// decoded output.
pub const DECODING_ATTRIBUTES: [&str; 4] = ["_FillValue", "missing_value", "scale_factor", "add_offset"];

/// Layout of one variable, time dimension excluded
#[derive(Debug, Clone)]
pub struct VariableLayout {
    pub name: String,
    pub data_type: String,
    /// Spatial dimension names
    pub dims: Vec<String>,
    /// Spatial shape
    pub shape: Vec<usize>,
    /// Position of the time dimension in the stored variable, if it has one
    pub time_axis: Option<usize>,
    pub attributes: Vec<(String, AttributeValue)>,
    pub decoding: ValueDecoding,
}

/// A variable without a time dimension, carried through unchanged
#[derive(Debug, Clone)]
pub struct StaticVariable {
    pub layout: VariableLayout,
    pub data: ArrayD<f64>,
}

/// Everything the assembler needs to know about the files before reading data
#[derive(Debug, Clone)]
pub struct FieldLayout {
    /// File the layout was taken from
    pub source: String,
    pub time_variable: String,
    pub time_dimension: String,
    /// Spatial dimensions used by any kept variable
    pub dimensions: Vec<DimensionInfo>,
    pub time_variables: Vec<VariableLayout>,
    pub static_variables: Vec<StaticVariable>,
    pub global_attributes: Vec<(String, AttributeValue)>,
    /// Number of variables in the template, time coordinate excluded
    pub raw_variable_count: usize,
}

impl FieldLayout {
    /// Builds a layout from already loaded data; used by in-memory sources.
    #[must_use]
    pub fn from_field(field: &TimeIndexedField, time_variable: &str) -> Self {
        let mut dimensions: Vec<DimensionInfo> = Vec::new();
        let time_variables = field
            .variables
            .iter()
            .map(|var| {
                let dims = var.spatial_dims();
                let shape: Vec<usize> = var
                    .data
                    .shape()
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &len)| if i == var.time_axis { None } else { Some(len) })
                    .collect();
                for (name, &length) in dims.iter().zip(&shape) {
                    if !dimensions.iter().any(|d| &d.name == name) {
                        dimensions.push(DimensionInfo {
                            name: name.clone(),
                            length,
                            is_unlimited: false,
                        });
                    }
                }
                VariableLayout {
                    name: var.name.clone(),
                    data_type: "float(f64)".to_string(),
                    dims,
                    shape,
                    time_axis: Some(var.time_axis),
                    attributes: Vec::new(),
                    decoding: ValueDecoding::default(),
                }
            })
            .collect();

        Self {
            source: field.source.clone(),
            time_variable: time_variable.to_string(),
            time_dimension: time_variable.to_string(),
            dimensions,
            time_variables,
            static_variables: Vec::new(),
            global_attributes: Vec::new(),
            raw_variable_count: field.raw_variable_count,
        }
    }

    /// Whether the auxiliary bookkeeping variable is dropped from this layout
    #[must_use]
    pub const fn drops_auxiliary(&self) -> bool {
        should_drop_auxiliary(self.raw_variable_count)
    }

    /// Time-dependent variables that take part in the monthly means
    pub fn monthly_variables(&self) -> impl Iterator<Item = &VariableLayout> {
        let drop = self.drops_auxiliary();
        self.time_variables
            .iter()
            .filter(move |v| !(drop && v.name == AUXILIARY_VARIABLE))
    }

    /// Static variables that are written to the output
    pub fn kept_static_variables(&self) -> impl Iterator<Item = &StaticVariable> {
        let drop = self.drops_auxiliary();
        self.static_variables
            .iter()
            .filter(move |v| !(drop && v.layout.name == AUXILIARY_VARIABLE))
    }

    /// The fully missing bucket state every month starts from
    #[must_use]
    pub fn placeholder(&self) -> ReducedField {
        ReducedField {
            time: None,
            variables: self
                .monthly_variables()
                .map(|v| ReducedVariable {
                    name: v.name.clone(),
                    dims: v.dims.clone(),
                    data: ArrayD::from_elem(IxDyn(&v.shape), f64::NAN),
                })
                .collect(),
        }
    }
}

/// Debug-formatted NetCDF type of a variable, lower case.
pub fn variable_data_type(var: &Variable) -> String {
    format!("{:?}", var.vartype()).to_lowercase()
}

/// Whether a type string names a numeric type that can be averaged.
#[must_use]
pub fn is_numeric_type(data_type: &str) -> bool {
    !["char", "string", "compound", "opaque", "vlen", "enum"]
        .iter()
        .any(|kind| data_type.contains(kind))
}

/// Numeric value of a scalar (or first element of a vector) attribute.
#[must_use]
pub fn attribute_as_f64(value: &AttributeValue) -> Option<f64> {
    match value {
        AttributeValue::Double(v) => Some(*v),
        AttributeValue::Float(v) => Some(f64::from(*v)),
        AttributeValue::Int(v) => Some(f64::from(*v)),
        AttributeValue::Uint(v) => Some(f64::from(*v)),
        AttributeValue::Short(v) => Some(f64::from(*v)),
        AttributeValue::Ushort(v) => Some(f64::from(*v)),
        AttributeValue::Schar(v) => Some(f64::from(*v)),
        AttributeValue::Uchar(v) => Some(f64::from(*v)),
        AttributeValue::Longlong(v) => Some(*v as f64),
        AttributeValue::Ulonglong(v) => Some(*v as f64),
        AttributeValue::Doubles(vs) => vs.first().copied(),
        AttributeValue::Floats(vs) => vs.first().map(|v| f64::from(*v)),
        AttributeValue::Ints(vs) => vs.first().map(|v| f64::from(*v)),
        AttributeValue::Shorts(vs) => vs.first().map(|v| f64::from(*v)),
        _ => None,
    }
}

/// Text of a string attribute.
#[must_use]
pub fn attribute_as_str(attributes: &[(String, AttributeValue)], name: &str) -> Option<String> {
    attributes.iter().find(|(key, _)| key == name).and_then(|(_, value)| match value {
        AttributeValue::Str(s) => Some(s.clone()),
        _ => None,
    })
}

/// All readable attributes of a variable, in file order.
pub fn read_attributes(var: &Variable) -> Vec<(String, AttributeValue)> {
    var.attributes()
        .filter_map(|attr| match attr.value() {
            Ok(value) => Some((attr.name().to_string(), value)),
            Err(e) => {
                log::warn!("Skipping unreadable attribute '{}' on '{}': {}", attr.name(), var.name(), e);
                None
            }
        })
        .collect()
}

/// Dimension names of a variable.
pub fn dimension_names(var: &Variable) -> Vec<String> {
    var.dimensions().iter().map(|d| d.name().to_string()).collect()
}

/// Reads the layout of an open file around the time coordinate `time_variable`.
///
/// Static variables are read in full here since they are written to the
/// output once, straight from the template.
pub fn read_layout(file: &File, source: &str, time_variable: &str) -> Result<FieldLayout> {
    let time_var = file
        .variable(time_variable)
        .ok_or_else(|| RomsMonthlyError::VariableNotFound {
            var: time_variable.to_string(),
        })?;
    let time_dims = dimension_names(&time_var);
    let time_dimension = match time_dims.as_slice() {
        [dim] => dim.clone(),
        _ => {
            return Err(RomsMonthlyError::Generic(format!(
                "Time coordinate '{}' must be one-dimensional, found dimensions {:?}",
                time_variable, time_dims
            )))
        }
    };

    let mut dimensions: Vec<DimensionInfo> = Vec::new();
    let mut time_variables = Vec::new();
    let mut static_variables = Vec::new();
    let mut raw_variable_count = 0;

    for var in file.variables() {
        if var.name() == time_variable {
            continue;
        }
        raw_variable_count += 1;

        let data_type = variable_data_type(&var);
        if !is_numeric_type(&data_type) {
            log::debug!("Skipping non-numeric variable '{}' ({})", var.name(), data_type);
            continue;
        }

        let all_dims = dimension_names(&var);
        let time_axis = all_dims.iter().position(|d| *d == time_dimension);

        let mut dims = Vec::new();
        let mut shape = Vec::new();
        for (i, dim) in var.dimensions().iter().enumerate() {
            if Some(i) == time_axis {
                continue;
            }
            let info = DimensionInfo {
                name: dim.name().to_string(),
                length: dim.len(),
                is_unlimited: dim.is_unlimited(),
            };
            dims.push(info.name.clone());
            shape.push(info.length);
            if !dimensions.iter().any(|d| d.name == info.name) {
                dimensions.push(info);
            }
        }

        let attributes = read_attributes(&var);
        let layout = VariableLayout {
            name: var.name().to_string(),
            data_type,
            dims,
            shape: shape.clone(),
            time_axis,
            decoding: ValueDecoding::from_attributes(&attributes),
            attributes,
        };

        if time_axis.is_some() {
            time_variables.push(layout);
        } else {
            let mut values = var.get_values::<f64, _>(..)?;
            layout.decoding.apply(&mut values);
            let data = ArrayD::from_shape_vec(IxDyn(&shape), values)?;
            static_variables.push(StaticVariable { layout, data });
        }
    }

    let global_attributes = file
        .attributes()
        .filter_map(|attr| attr.value().ok().map(|value| (attr.name().to_string(), value)))
        .collect();

    Ok(FieldLayout {
        source: source.to_string(),
        time_variable: time_variable.to_string(),
        time_dimension,
        dimensions,
        time_variables,
        static_variables,
        global_attributes,
        raw_variable_count,
    })
}

/// Lists the layout's dimensions and variables in a clean, organized format.
pub fn print_layout(layout: &FieldLayout) {
    println!("\n Template: {}", layout.source);
    println!(" Time coordinate: {} (dimension '{}')", layout.time_variable, layout.time_dimension);

    println!("\n Dimensions");
    println!("==============");
    if layout.dimensions.is_empty() {
        println!("   (No dimensions found)");
    }
    for dim in &layout.dimensions {
        let length_info = if dim.is_unlimited {
            format!("{} (unlimited)", dim.length)
        } else {
            dim.length.to_string()
        };
        println!("    {} = {}", dim.name, length_info);
    }

    println!("\n Monthly variables");
    println!("=====================");
    for var in layout.monthly_variables() {
        print_variable(var);
    }

    println!("\n Static variables");
    println!("====================");
    for var in layout.kept_static_variables() {
        print_variable(&var.layout);
    }

    if layout.drops_auxiliary() {
        println!(
            "\n⚠ {} variables in template; '{}' is dropped from the means",
            layout.raw_variable_count, AUXILIARY_VARIABLE
        );
    }
}

fn print_variable(var: &VariableLayout) {
    if var.dims.is_empty() {
        println!("    {} ({}): scalar", var.name, var.data_type);
    } else {
        let shape: Vec<String> = var.shape.iter().map(ToString::to_string).collect();
        println!(
            "    {} ({}): [{}] = ({})",
            var.name,
            var.data_type,
            var.dims.join(", "),
            shape.join(" × ")
        );
    }
    if let Some(units) = attribute_as_str(&var.attributes, "units") {
        println!("      └─ units: {}", units);
    }
}
