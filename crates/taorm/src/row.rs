//! Row materialization into caller-provided destinations.
//!
//! Rows are first turned into name-keyed records in the `serde_json` data
//! model, then decoded into the destination with `serde`. The destination can
//! be any `DeserializeOwned` shape: a typed struct, a map, a
//! `serde_json::Value`, or a sequence of any of those. Field names must match
//! column names.

use crate::client::RowStream;
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use std::fmt;

/// Whether a destination type decodes from a sequence or a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `Vec<T>`, `VecDeque<T>`, sets, tuples, arrays
    Sequence,
    /// Structs, maps, `serde_json::Value`, scalars
    Single,
}

/// Determine the shape `T` deserializes from.
///
/// `T::deserialize` is run against a probe that records the first request
/// it receives. `Option`, `Box` and newtype wrappers are looked through.
pub fn shape_of<T: DeserializeOwned>() -> Shape {
    match T::deserialize(ShapeProbe) {
        Err(ProbeError(Some(shape))) => shape,
        _ => Shape::Single,
    }
}

struct ShapeProbe;

#[derive(Debug)]
struct ProbeError(Option<Shape>);

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape probe stopped at {:?}", self.0)
    }
}

impl std::error::Error for ProbeError {}

impl de::Error for ProbeError {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        ProbeError(None)
    }
}

impl<'de> Deserializer<'de> for ShapeProbe {
    type Error = ProbeError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(ProbeError(Some(Shape::Single)))
    }

    fn deserialize_seq<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(ProbeError(Some(Shape::Sequence)))
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(ProbeError(Some(Shape::Sequence)))
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct tuple_struct map struct enum identifier ignored_any
    }
}

/// Read every row into `dest`.
///
/// A sequence destination receives all rows. A single destination receives
/// the **last** row read; with zero rows it is left untouched.
pub fn materialize_rows<T: DeserializeOwned>(
    rows: &mut dyn RowStream,
    dest: &mut T,
) -> OrmResult<()> {
    let columns = rows.column_names()?;
    let mut slots = vec![Value::Null; columns.len()];
    let mut records = Vec::new();

    while rows.next()? {
        rows.scan_into(&mut slots)?;
        let record: serde_json::Map<String, serde_json::Value> = columns
            .iter()
            .zip(&slots)
            .map(|(column, value)| (column.clone(), value.to_json()))
            .collect();
        records.push(serde_json::Value::Object(record));
    }

    match shape_of::<T>() {
        Shape::Sequence => {
            *dest = serde_json::from_value(serde_json::Value::Array(records))?;
        }
        Shape::Single => {
            if let Some(last) = records.pop() {
                *dest = serde_json::from_value(last)?;
            }
        }
    }
    Ok(())
}

/// Read the first column of every row as an integer, keeping the last.
///
/// With zero rows `dest` is left untouched.
pub fn materialize_scalar(rows: &mut dyn RowStream, dest: &mut i64) -> OrmResult<()> {
    let columns = rows.column_names()?;
    let Some(column) = columns.first() else {
        return Err(OrmError::type_mismatch("", "query returned no columns"));
    };
    let mut slots = vec![Value::Null; columns.len()];

    while rows.next()? {
        rows.scan_into(&mut slots)?;
        *dest = slots[0].as_i64().ok_or_else(|| {
            OrmError::type_mismatch(
                column.as_str(),
                format!("expected an integer, got {}", slots[0].kind()),
            )
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryRows;
    use serde::Deserialize;
    use std::collections::{BTreeMap, HashMap, VecDeque};

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Item {
        id: i64,
        name: String,
    }

    fn two_rows() -> MemoryRows {
        MemoryRows::new(
            vec!["id".into(), "name".into()],
            vec![
                vec![Value::Int(1), Value::from("a")],
                vec![Value::Int(2), Value::from("b")],
            ],
        )
    }

    #[test]
    fn probes_destination_shapes() {
        assert_eq!(shape_of::<Vec<Item>>(), Shape::Sequence);
        assert_eq!(shape_of::<VecDeque<Item>>(), Shape::Sequence);
        assert_eq!(shape_of::<Option<Vec<Item>>>(), Shape::Sequence);
        assert_eq!(shape_of::<(Item, Item)>(), Shape::Sequence);
        assert_eq!(shape_of::<Item>(), Shape::Single);
        assert_eq!(shape_of::<Option<Item>>(), Shape::Single);
        assert_eq!(shape_of::<HashMap<String, i64>>(), Shape::Single);
        assert_eq!(shape_of::<serde_json::Value>(), Shape::Single);
        assert_eq!(shape_of::<i64>(), Shape::Single);
    }

    #[test]
    fn sequence_receives_every_row() {
        let mut dest: Vec<Item> = Vec::new();
        materialize_rows(&mut two_rows(), &mut dest).unwrap();
        assert_eq!(
            dest,
            vec![
                Item { id: 1, name: "a".into() },
                Item { id: 2, name: "b".into() },
            ]
        );
    }

    #[test]
    fn single_receives_last_row() {
        let mut dest = Item::default();
        materialize_rows(&mut two_rows(), &mut dest).unwrap();
        assert_eq!(dest, Item { id: 2, name: "b".into() });
    }

    #[test]
    fn document_destinations() {
        let mut map: BTreeMap<String, serde_json::Value> = BTreeMap::new();
        materialize_rows(&mut two_rows(), &mut map).unwrap();
        assert_eq!(map["id"], serde_json::json!(2));

        let mut docs: Vec<serde_json::Value> = Vec::new();
        materialize_rows(&mut two_rows(), &mut docs).unwrap();
        assert_eq!(docs[0], serde_json::json!({"id": 1, "name": "a"}));
    }

    #[test]
    fn zero_rows_leave_single_destination_untouched() {
        let mut rows = MemoryRows::new(vec!["id".into(), "name".into()], vec![]);
        let mut dest = Item { id: 9, name: "keep".into() };
        materialize_rows(&mut rows, &mut dest).unwrap();
        assert_eq!(dest.id, 9);

        let mut rows = MemoryRows::new(vec!["id".into()], vec![]);
        let mut list = vec![Item::default()];
        materialize_rows(&mut rows, &mut list).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn mismatched_fields_are_encoding_errors() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Other {
            missing: i64,
        }
        let mut dest: Vec<Other> = Vec::new();
        let err = materialize_rows(&mut two_rows(), &mut dest).unwrap_err();
        assert!(matches!(err, OrmError::Encoding(_)));
    }

    #[test]
    fn scalar_keeps_last_integer() {
        let mut rows = MemoryRows::new(
            vec!["total".into()],
            vec![vec![Value::Int(3)], vec![Value::Int(7)]],
        );
        let mut total = 0;
        materialize_scalar(&mut rows, &mut total).unwrap();
        assert_eq!(total, 7);
    }

    #[test]
    fn scalar_rejects_non_integers() {
        let mut rows = MemoryRows::new(vec!["total".into()], vec![vec![Value::Float(1.5)]]);
        let mut total = 0;
        let err = materialize_scalar(&mut rows, &mut total).unwrap_err();
        assert_eq!(
            err,
            OrmError::type_mismatch("total", "expected an integer, got float")
        );
    }
}
