use chrono::NaiveDate;

/// One row of the entry column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListRow {
    /// Day heading placed before the first entry published that day.
    Separator { date: String },
    Entry { id: String },
}

impl ListRow {
    pub fn entry(id: impl Into<String>) -> Self {
        ListRow::Entry { id: id.into() }
    }

    pub fn separator(date: NaiveDate) -> Self {
        ListRow::Separator {
            date: date.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn entry_id(&self) -> Option<&str> {
        match self {
            ListRow::Entry { id } => Some(id),
            ListRow::Separator { .. } => None,
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, ListRow::Separator { .. })
    }
}

/// Build the row sequence for `(id, day)` pairs already in display order.
///
/// With `separators` set, a date row is emitted whenever the day changes.
pub fn build_rows<'a, I>(items: I, separators: bool) -> Vec<ListRow>
where
    I: IntoIterator<Item = (&'a str, NaiveDate)>,
{
    let mut rows = Vec::new();
    let mut last_day: Option<NaiveDate> = None;

    for (id, day) in items {
        if separators && last_day != Some(day) {
            rows.push(ListRow::separator(day));
            last_day = Some(day);
        }
        rows.push(ListRow::entry(id));
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Entry;

    fn entry_on(source_id: &str, published: &str) -> Entry {
        let mut entry = Entry::new(1, "https://example.com/feed.xml", source_id);
        entry.published_at = Some(published.parse().unwrap());
        entry
    }

    #[test]
    fn test_one_separator_before_same_day_entries() {
        let e1 = entry_on("e1", "2024-01-01T10:00:00Z");
        let e2 = entry_on("e2", "2024-01-01T09:00:00Z");
        let rows = build_rows([&e1, &e2].map(|e| (e.id.as_str(), e.day())), true);

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            ListRow::Separator {
                date: "2024-01-01".into()
            }
        );
        let eligible: Vec<&str> = rows.iter().filter_map(ListRow::entry_id).collect();
        assert_eq!(eligible, vec![e1.id.as_str(), e2.id.as_str()]);
    }

    #[test]
    fn test_build_rows_groups_by_day() {
        let a = entry_on("a", "2024-01-02T09:00:00Z");
        let b = entry_on("b", "2024-01-02T08:00:00Z");
        let c = entry_on("c", "2024-01-01T23:00:00Z");

        let rows = build_rows(
            [&a, &b, &c].map(|e| (e.id.as_str(), e.day())),
            true,
        );
        assert_eq!(rows.len(), 5);
        assert!(rows[0].is_separator());
        assert_eq!(rows[1].entry_id(), Some(a.id.as_str()));
        assert_eq!(rows[2].entry_id(), Some(b.id.as_str()));
        assert_eq!(
            rows[3],
            ListRow::Separator {
                date: "2024-01-01".into()
            }
        );
        assert_eq!(rows[4].entry_id(), Some(c.id.as_str()));
    }

    #[test]
    fn test_build_rows_without_separators() {
        let a = entry_on("a", "2024-01-02T09:00:00Z");
        let c = entry_on("c", "2024-01-01T23:00:00Z");
        let rows = build_rows([&a, &c].map(|e| (e.id.as_str(), e.day())), false);
        assert!(rows.iter().all(|r| !r.is_separator()));
        assert_eq!(rows.len(), 2);
    }
}
