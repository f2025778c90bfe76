use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;
use crate::model::{Month, MonthValues, StatementScope, VersionId};
use crate::reconcile::{section_span, sum_details};
use crate::store::StatementStore;

fn default_section() -> String {
    "Income".to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRequest {
    pub branch_id: String,
    pub year: i32,
    pub departments: Vec<String>,
    #[serde(default = "default_section")]
    pub section: String,
    /// `None` sums the drafts.
    #[serde(default)]
    pub version_id: Option<VersionId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentTotal {
    pub department: String,
    pub months: MonthValues,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionAggregate {
    pub section: String,
    pub departments: Vec<DepartmentTotal>,
    pub total: MonthValues,
}

/// Sum the detail rows of one section across the statements of several departments.
pub async fn aggregate_section<S: StatementStore>(
    store: &S,
    request: &AggregateRequest,
) -> Result<SectionAggregate, ReconcileError> {
    let departments = try_join_all(
        request
            .departments
            .iter()
            .map(|department| department_total(store, request, department)),
    )
    .await?;

    let mut total = MonthValues::default();
    for department in &departments {
        total.add(&department.months);
    }

    Ok(SectionAggregate {
        section: request.section.clone(),
        departments,
        total,
    })
}

async fn department_total<S: StatementStore>(
    store: &S,
    request: &AggregateRequest,
    department: &str,
) -> Result<DepartmentTotal, ReconcileError> {
    let scope = StatementScope::new(&request.branch_id, department, request.year);
    let statement = match request.version_id {
        Some(id) => scope.version(id),
        None => scope.draft(),
    };
    let rows = store.list_rows(&statement, None).await?;

    let months = match section_span(&rows, &request.section) {
        Some(span) => sum_details(&rows[span], &Month::ALL),
        None => {
            tracing::debug!(%statement, section = %request.section, "section not found");
            MonthValues::default()
        }
    };
    Ok(DepartmentTotal {
        department: department.to_owned(),
        months,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LineItem, NewLineItem};
    use crate::reconcile::testing::{WithMonth, detail, header, sub_header, total};
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    async fn seed(store: &MemoryStore, department: &str, rows: Vec<LineItem>) {
        let rows = rows
            .into_iter()
            .zip(1..)
            .map(|(row, order)| NewLineItem {
                row_order: order,
                ..row.to_new()
            })
            .collect();
        let statement = StatementScope::new("north", department, 2025).draft();
        store.insert_rows(&statement, rows).await.unwrap();
    }

    fn request(departments: &[&str]) -> AggregateRequest {
        AggregateRequest {
            branch_id: "north".to_owned(),
            year: 2025,
            departments: departments.iter().map(|d| d.to_string()).collect(),
            section: default_section(),
            version_id: None,
        }
    }

    #[tokio::test]
    async fn sums_section_details_per_department() {
        let store = MemoryStore::new();
        seed(
            &store,
            "maintenance",
            vec![
                header("Income"),
                sub_header("Contracts"),
                detail("Mowing", Some("4100")).with(Month::Jan, dec!(100.10)),
                detail("Snow", Some("4200")).with(Month::Jan, dec!(50)),
                total("Total Income").with(Month::Jan, dec!(999)),
                detail("Stray", None).with(Month::Jan, dec!(7)),
                header("Expenses"),
                detail("Fuel", Some("5100")).with(Month::Jan, dec!(30)),
            ],
        )
        .await;
        seed(
            &store,
            "installs",
            vec![
                header("Income"),
                detail("Plants", Some("4300"))
                    .with(Month::Jan, dec!(20.005))
                    .with(Month::Dec, dec!(5)),
                header("Expenses"),
                detail("Fuel", Some("5100")).with(Month::Jan, dec!(40)),
            ],
        )
        .await;
        seed(&store, "irrigation", vec![header("Expenses"), detail("Pipe", None)]).await;

        let aggregate = aggregate_section(
            &store,
            &request(&["maintenance", "installs", "irrigation", "missing"]),
        )
        .await
        .unwrap();

        let jan: Vec<_> = aggregate
            .departments
            .iter()
            .map(|d| (d.department.as_str(), d.months.get(Month::Jan)))
            .collect();
        assert_eq!(
            jan,
            [
                ("maintenance", dec!(150.10)),
                ("installs", dec!(20.01)),
                ("irrigation", dec!(0)),
                ("missing", dec!(0)),
            ]
        );
        assert_eq!(aggregate.total.get(Month::Jan), dec!(170.11));
        assert_eq!(aggregate.total.get(Month::Dec), dec!(5));
    }

    #[test]
    fn section_defaults_to_income() {
        let request: AggregateRequest = serde_json::from_value(serde_json::json!({
            "branchId": "north",
            "year": 2025,
            "departments": ["maintenance"],
        }))
        .unwrap();
        assert_eq!(request.section, "Income");
        assert_eq!(request.version_id, None);
    }
}
