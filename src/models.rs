use serde::Serialize;

/// Ordered task texts. Position is the only identity a task has.
pub type TaskList = Vec<String>;

#[derive(Debug, Clone, PartialEq)]
pub enum PersistEvent {
    Saved { len: usize },
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Focus {
    Input,
    List,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskRow<'a> {
    pub index: usize,
    pub text: &'a str,
}

pub fn task_rows(list: &[String]) -> Vec<TaskRow<'_>> {
    list.iter()
        .enumerate()
        .map(|(index, text)| TaskRow { index, text })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_rows_number_from_zero_in_list_order() {
        let list = vec!["a".to_string(), "a".to_string(), "b".to_string()];
        let rows = task_rows(&list);
        let pairs: Vec<(usize, &str)> = rows.iter().map(|r| (r.index, r.text)).collect();
        assert_eq!(pairs, vec![(0, "a"), (1, "a"), (2, "b")]);
        assert!(task_rows(&[]).is_empty());
    }
}
