//! Fixture data sources shaped like typical grid records.

use editlog_core::Value;

const DAY_MS: i64 = 86_400_000;
/// 2018-01-01T00:00:00Z.
const EPOCH_2018_MS: i64 = 1_514_764_800_000;

/// `count` product rows with `ID` 0..count.
pub fn product_data(count: usize) -> Vec<Value> {
    (0..count as i64)
        .map(|i| {
            Value::object([
                ("ID", Value::from(i)),
                ("ProductName", Value::from(format!("ProductName{i}"))),
                ("Category", Value::from(format!("Category{i}"))),
                ("Downloads", Value::from(i * 125)),
                ("Items", Value::from(format!("Items{i}"))),
                ("Released", Value::from(i % 2 == 0)),
                ("ReleaseDate", Value::Timestamp(EPOCH_2018_MS + i * DAY_MS)),
                ("Test", Value::from(format!("test{i}"))),
            ])
        })
        .collect()
}

/// `count` text rows, `"Row 0"` onwards.
pub fn primitive_rows(count: usize) -> Vec<Value> {
    (0..count).map(|i| Value::from(format!("Row {i}"))).collect()
}

fn employee(id: i64, name: &str, age: i64, hired_days: i64, on_pto: bool, reports: Option<Vec<Value>>) -> Value {
    let mut fields = vec![
        ("ID", Value::from(id)),
        ("Name", Value::from(name)),
        ("Age", Value::from(age)),
        ("HireDate", Value::Timestamp(EPOCH_2018_MS - hired_days * DAY_MS)),
        ("OnPTO", Value::from(on_pto)),
    ];
    if let Some(reports) = reports {
        fields.push(("Employees", Value::List(reports)));
    }
    Value::object(fields)
}

/// Four top-level managers with nested `Employees` lists keyed by `ID`.
pub fn employee_tree() -> Vec<Value> {
    vec![
        employee(
            147,
            "John Winchester",
            55,
            3_540,
            false,
            Some(vec![
                employee(475, "Michael Langdon", 43, 2_374, false, None),
                employee(957, "Thomas Hardy", 29, 3_088, true, None),
                employee(
                    317,
                    "Monica Reyes",
                    31,
                    1_201,
                    false,
                    Some(vec![
                        employee(711, "Roselyn Beard", 46, 3_714, true, None),
                        employee(
                            998,
                            "Sven Ottlieb",
                            44,
                            2_973,
                            false,
                            Some(vec![employee(299, "Peter Lewis", 25, 1_560, false, None)]),
                        ),
                    ]),
                ),
            ]),
        ),
        employee(
            19,
            "Yang Wang",
            61,
            2_891,
            false,
            Some(vec![
                employee(15, "Antonio Moreno", 44, 4_392, true, Some(Vec::new())),
                employee(17, "Pedro Afonso", 50, 2_163, false, None),
            ]),
        ),
        employee(12, "Casey Houston", 44, 1_630, false, None),
        employee(
            101,
            "Zoe Hansen",
            38,
            980,
            false,
            Some(vec![employee(102, "Ana Sanders", 36, 410, false, None)]),
        ),
    ]
}
