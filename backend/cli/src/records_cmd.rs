//! `shelfcount records`: print every tally in the database.

use anyhow::{Context, Result};
use shelfcount_core::AggregateRecord;
use shelfcount_store::{SqliteTallyStore, TallyStore};

use crate::terminal_output::{render_table, Column};

pub async fn run(db_path: &str) -> Result<()> {
    let store = SqliteTallyStore::open(db_path)
        .with_context(|| format!("Failed to open database {db_path}"))?;
    let records = store.get_all().await?;
    print!("{}", format_records(&records));
    Ok(())
}

pub fn format_records(records: &[AggregateRecord]) -> String {
    if records.is_empty() {
        return "No records yet.\n".to_string();
    }
    let columns = [Column::right("ID"), Column::right("Count"), Column::left("Object")];
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| vec![r.id.to_string(), r.count.to_string(), r.object_name.clone()])
        .collect();
    render_table(&columns, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_rows_in_order() {
        let records = vec![
            AggregateRecord { id: 1, count: 5, object_name: "Banana".into() },
            AggregateRecord { id: 4, count: 0, object_name: "Apple".into() },
        ];
        let out = format_records(&records);
        let banana = out.find("Banana").unwrap();
        let apple = out.find("Apple").unwrap();
        assert!(banana < apple);
    }

    #[test]
    fn empty_database_message() {
        assert_eq!(format_records(&[]), "No records yet.\n");
    }
}
