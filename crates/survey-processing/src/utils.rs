//! Shared dataframe helpers used across the engine.

use polars::prelude::*;

/// Check if a DataType is numeric (integer or float).
///
/// Columns of any other type pass through the cleaning steps unchanged.
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Names of the numeric columns, in dataset order.
pub fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| is_numeric_dtype(col.dtype()))
        .map(|col| col.name().to_string())
        .collect()
}

/// Materialize a column as `f64` values, preserving nulls.
pub fn column_f64(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let col = df.column(name)?;
    let float_col = col.cast(&DataType::Float64)?;
    let ca = float_col.f64()?;
    Ok(ca.into_iter().collect())
}

/// Materialize the non-null values of a column as `f64`.
pub fn column_f64_non_null(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
    Ok(column_f64(df, name)?.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float32));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_numeric_column_names_preserves_order() {
        let df = df![
            "name" => ["a", "b"],
            "age" => [30i64, 40],
            "income" => [1.5, 2.5],
        ]
        .unwrap();

        assert_eq!(
            numeric_column_names(&df),
            vec!["age".to_string(), "income".to_string()]
        );
    }

    #[test]
    fn test_column_f64_preserves_nulls() {
        let df = df![
            "x" => [Some(1.0), None, Some(3.0)],
        ]
        .unwrap();

        let values = column_f64(&df, "x").unwrap();
        assert_eq!(values, vec![Some(1.0), None, Some(3.0)]);
        assert_eq!(column_f64_non_null(&df, "x").unwrap(), vec![1.0, 3.0]);
    }

    #[test]
    fn test_column_f64_casts_integers() {
        let df = df![
            "n" => [1i64, 2, 3],
        ]
        .unwrap();

        assert_eq!(
            column_f64(&df, "n").unwrap(),
            vec![Some(1.0), Some(2.0), Some(3.0)]
        );
    }
}
