use indexmap::IndexMap;

use crate::error::AthenaError;

/// One data row keyed by column name, in header order.
///
/// `None` is SQL NULL and serializes as JSON `null`.
pub type Record = IndexMap<String, Option<String>>;

/// Raw result set as Athena returns it for a `SELECT`: the first row echoes
/// the column names, every following row is data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    rows: Vec<Vec<Option<String>>>,
}

impl ResultSet {
    pub fn new(rows: Vec<Vec<Option<String>>>) -> Self {
        Self { rows }
    }

    /// Zip every data row with the header into a [`Record`].
    ///
    /// Rows shorter than the header are padded with `None`; longer rows and
    /// a missing or unnamed header are [`AthenaError::MalformedResult`].
    pub fn into_records(self) -> Result<Vec<Record>, AthenaError> {
        let mut rows = self.rows.into_iter();
        let header = rows
            .next()
            .ok_or_else(|| AthenaError::MalformedResult("result set has no header row".into()))?;

        let columns = header
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                name.ok_or_else(|| {
                    AthenaError::MalformedResult(format!("header column {} has no name", i))
                })
            })
            .collect::<Result<Vec<String>, _>>()?;

        rows.enumerate()
            .map(|(i, row)| zip_row(&columns, row, i + 1))
            .collect()
    }
}

fn zip_row(
    columns: &[String],
    row: Vec<Option<String>>,
    row_number: usize,
) -> Result<Record, AthenaError> {
    if row.len() > columns.len() {
        return Err(AthenaError::MalformedResult(format!(
            "row {} has {} values but the header has {} columns",
            row_number,
            row.len(),
            columns.len()
        )));
    }

    let mut values = row.into_iter();
    Ok(columns
        .iter()
        .map(|column| (column.clone(), values.next().flatten()))
        .collect())
}
