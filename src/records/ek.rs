//! E-kernel (EK) attribute descriptors and segment summaries.
//!
//! [`SegmentSummary`] keeps its column names and descriptors index-aligned:
//! columns are only added in pairs, and a summary assembled from parts is
//! rejected when the declared column count disagrees with either list.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{EK_COLUMN_NAME_LEN, EK_MAX_COLUMNS, EK_TABLE_NAME_LEN, SPICE_FALSE, SPICE_TRUE},
    spice_errors::SpiceError,
    type_tag::TypeTag,
};

/// Attributes of one EK column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub class_id: i32,
    pub element_type: TypeTag,
    pub string_length: i32,
    pub array_size: i32,
    pub is_indexed: bool,
    pub null_allowed: bool,
}

/// Binary layout of CSPICE's `SpiceEKAttDsc`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpiceEKAttDsc {
    pub cclass: i32,
    pub dtype: i32,
    pub strlen: i32,
    pub size: i32,
    pub indexd: i32,
    pub nullok: i32,
}

impl From<&AttributeDescriptor> for SpiceEKAttDsc {
    fn from(desc: &AttributeDescriptor) -> Self {
        let flag = |b: bool| if b { SPICE_TRUE } else { SPICE_FALSE };
        SpiceEKAttDsc {
            cclass: desc.class_id,
            dtype: desc.element_type.code(),
            strlen: desc.string_length,
            size: desc.array_size,
            indexd: flag(desc.is_indexed),
            nullok: flag(desc.null_allowed),
        }
    }
}

impl TryFrom<&SpiceEKAttDsc> for AttributeDescriptor {
    type Error = SpiceError;

    fn try_from(raw: &SpiceEKAttDsc) -> Result<Self, Self::Error> {
        Ok(AttributeDescriptor {
            class_id: raw.cclass,
            element_type: TypeTag::try_from(raw.dtype)?,
            string_length: raw.strlen,
            array_size: raw.size,
            is_indexed: raw.indexd != SPICE_FALSE,
            null_allowed: raw.nullok != SPICE_FALSE,
        })
    }
}

impl fmt::Display for AttributeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "class={} type={} strlen={} size={} indexed={} nullok={}",
            self.class_id,
            self.element_type,
            self.string_length,
            self.array_size,
            self.is_indexed,
            self.null_allowed
        )
    }
}

/// Summary of one EK segment: table name, row count and column attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SegmentSummary {
    pub table_name: String,
    pub row_count: i32,
    column_names: Vec<String>,
    column_descriptors: Vec<AttributeDescriptor>,
}

impl SegmentSummary {
    pub fn new(table_name: impl Into<String>, row_count: i32) -> Self {
        SegmentSummary {
            table_name: table_name.into(),
            row_count,
            column_names: Vec::new(),
            column_descriptors: Vec::new(),
        }
    }

    /// Assemble a summary from a declared column count and the two column lists.
    ///
    /// Return
    /// ------
    /// * [`SpiceError::ColumnMismatch`] unless both lists hold exactly `column_count` entries
    pub fn from_parts(
        table_name: impl Into<String>,
        row_count: i32,
        column_count: usize,
        column_names: Vec<String>,
        column_descriptors: Vec<AttributeDescriptor>,
    ) -> Result<Self, SpiceError> {
        if column_names.len() != column_count || column_descriptors.len() != column_count {
            return Err(SpiceError::ColumnMismatch {
                declared: column_count,
                names: column_names.len(),
                descriptors: column_descriptors.len(),
            });
        }
        Ok(SegmentSummary {
            table_name: table_name.into(),
            row_count,
            column_names,
            column_descriptors,
        })
    }

    /// Append one column, keeping names and descriptors aligned.
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        descriptor: AttributeDescriptor,
    ) -> Result<(), SpiceError> {
        if self.column_count() >= EK_MAX_COLUMNS {
            return Err(SpiceError::InvalidRecord(format!(
                "an EK segment holds at most {EK_MAX_COLUMNS} columns"
            )));
        }
        self.column_names.push(name.into());
        self.column_descriptors.push(descriptor);
        Ok(())
    }

    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn column_descriptors(&self) -> &[AttributeDescriptor] {
        &self.column_descriptors
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &AttributeDescriptor)> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.column_descriptors.iter())
    }

    pub fn column(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.columns()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, d)| d)
    }
}

impl fmt::Display for SegmentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "<EKSegSum: table={}, nrows={}, ncols={}>",
            self.table_name,
            self.row_count,
            self.column_count()
        )?;
        write!(
            f,
            "{}",
            self.columns()
                .map(|(name, desc)| format!("  {name:<32} {desc}"))
                .join("\n")
        )
    }
}

/// Binary layout of CSPICE's `SpiceEKSegSum`.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct SpiceEKSegSum {
    pub tabnam: [u8; EK_TABLE_NAME_LEN],
    pub nrows: i32,
    pub ncols: i32,
    pub cnames: [[u8; EK_COLUMN_NAME_LEN]; EK_MAX_COLUMNS],
    pub cdescrs: [SpiceEKAttDsc; EK_MAX_COLUMNS],
}

impl Default for SpiceEKSegSum {
    fn default() -> Self {
        SpiceEKSegSum {
            tabnam: [0; EK_TABLE_NAME_LEN],
            nrows: 0,
            ncols: 0,
            cnames: [[0; EK_COLUMN_NAME_LEN]; EK_MAX_COLUMNS],
            cdescrs: [SpiceEKAttDsc::default(); EK_MAX_COLUMNS],
        }
    }
}

fn c_text(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).trim_end().to_string()
}

fn fill_c_text(target: &mut [u8], text: &str, what: &str) -> Result<(), SpiceError> {
    if text.len() >= target.len() {
        return Err(SpiceError::InvalidRecord(format!(
            "{what} '{text}' is longer than {} bytes",
            target.len() - 1
        )));
    }
    target[..text.len()].copy_from_slice(text.as_bytes());
    target[text.len()..].fill(0);
    Ok(())
}

impl TryFrom<&SpiceEKSegSum> for SegmentSummary {
    type Error = SpiceError;

    fn try_from(raw: &SpiceEKSegSum) -> Result<Self, Self::Error> {
        let ncols = usize::try_from(raw.ncols)
            .ok()
            .filter(|&n| n <= EK_MAX_COLUMNS)
            .ok_or_else(|| {
                SpiceError::InvalidRecord(format!("invalid EK column count {}", raw.ncols))
            })?;

        let names = raw.cnames[..ncols].iter().map(|n| c_text(n)).collect();
        let descriptors = raw.cdescrs[..ncols]
            .iter()
            .map(AttributeDescriptor::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        SegmentSummary::from_parts(c_text(&raw.tabnam), raw.nrows, ncols, names, descriptors)
    }
}

impl TryFrom<&SegmentSummary> for SpiceEKSegSum {
    type Error = SpiceError;

    fn try_from(summary: &SegmentSummary) -> Result<Self, Self::Error> {
        let mut raw = SpiceEKSegSum::default();
        fill_c_text(&mut raw.tabnam, &summary.table_name, "table name")?;
        raw.nrows = summary.row_count;
        raw.ncols = summary.column_count() as i32;
        for (i, (name, desc)) in summary.columns().enumerate() {
            fill_c_text(&mut raw.cnames[i], name, "column name")?;
            raw.cdescrs[i] = SpiceEKAttDsc::from(desc);
        }
        Ok(raw)
    }
}
