// src/bank.rs

use std::path::Path;

use crate::{
    error::{BankError, QuizError},
    models::question::{Category, QuestionItem, QuestionSeed},
};

/// Ordered, immutable set of quiz questions.
///
/// Declaration order is the question order of every session.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    items: Vec<QuestionItem>,
}

impl QuestionBank {
    pub fn new(items: Vec<QuestionItem>) -> Result<Self, BankError> {
        if items.is_empty() {
            return Err(BankError::Empty);
        }
        Ok(Self { items })
    }

    /// Builds a bank from seeds, validating every item.
    pub fn from_seeds(seeds: Vec<QuestionSeed>) -> Result<Self, BankError> {
        let items = seeds
            .into_iter()
            .enumerate()
            .map(|(i, seed)| {
                QuestionItem::try_from(seed).map_err(|e| match e {
                    BankError::InvalidQuestion(msg) => {
                        BankError::InvalidQuestion(format!("question {}: {}", i, msg))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(items)
    }

    /// Loads a JSON array of questions from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let raw = std::fs::read_to_string(path)?;
        let seeds: Vec<QuestionSeed> = serde_json::from_str(&raw)?;
        Self::from_seeds(seeds)
    }

    /// The fixed Python core-selection question set.
    pub fn builtin() -> Result<Self, BankError> {
        Self::from_table(BUILTIN)
    }

    fn from_table(table: &[BuiltinItem]) -> Result<Self, BankError> {
        let items = table
            .iter()
            .map(|(category, difficulty, prompt, options, answer)| {
                QuestionItem::new(
                    *category,
                    *difficulty,
                    *prompt,
                    options.iter().map(|o| o.to_string()).collect(),
                    *answer,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(items)
    }

    pub fn item_at(&self, index: usize) -> Result<&QuestionItem, QuizError> {
        self.items.get(index).ok_or(QuizError::OutOfRange {
            index,
            size: self.items.len(),
        })
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }
}

type BuiltinItem = (Category, u32, &'static str, &'static [&'static str], &'static str);

const BUILTIN: &[BuiltinItem] = &[
    (
        Category::Tracing,
        3,
        "x = [1,2,3]\ny = x\nx.append(4)\nprint(y)",
        &["[1,2,3]", "[1,2,3,4]", "Error", "None"],
        "[1,2,3,4]",
    ),
    (
        Category::Debug,
        3,
        "for i in range(3)\n    print(i)",
        &["Error", "0 1 2", "1 2 3", "0 1 2 3"],
        "Error",
    ),
    (
        Category::Ds,
        3,
        "Which structure is best for FIFO?",
        &["List", "Set", "Deque", "Tuple"],
        "Deque",
    ),
    (
        Category::Concept,
        3,
        "Difference between tuple and list?",
        &["Tuple mutable", "List immutable", "Tuple immutable", "No difference"],
        "Tuple immutable",
    ),
    (
        Category::Tracing,
        3,
        "def f(a=[]):\n a.append(1)\n return a\nprint(f()); print(f())",
        &["[1][1]", "[1][1,1]", "Error", "[]"],
        "[1][1,1]",
    ),
    (
        Category::Debug,
        3,
        "def func():\n print(x)\nx = 5\nfunc()",
        &["5", "Error", "None", "0"],
        "Error",
    ),
    (
        Category::Ds,
        3,
        "Time complexity of inserting at index 0 in a list?",
        &["O(1)", "O(log n)", "O(n)", "O(n^2)"],
        "O(n)",
    ),
    (
        Category::Concept,
        3,
        "What does 'is' check in Python?",
        &["Value equality", "Reference equality", "Type equality", "Both"],
        "Reference equality",
    ),
    (
        Category::Tracing,
        3,
        "print(bool([]))",
        &["True", "False"],
        "False",
    ),
    (
        Category::Debug,
        3,
        "if True print('Hi')",
        &["Error", "Hi", "True", "False"],
        "Error",
    ),
    (
        Category::Ds,
        3,
        "Which method adds an item at the end of a list?",
        &["add()", "append()", "insert()", "extend()"],
        "append()",
    ),
    (
        Category::Concept,
        3,
        "What is Python's GIL?",
        &[
            "Global Interpreter Lock",
            "Graphical Interface Library",
            "General Input List",
            "None",
        ],
        "Global Interpreter Lock",
    ),
    (
        Category::Tracing,
        3,
        "x = 5\ny = x\nx = 7\nprint(y)",
        &["5", "7", "Error", "None"],
        "5",
    ),
    (
        Category::Debug,
        3,
        "print('2'+2)",
        &["4", "'22'", "Error", "2+2"],
        "Error",
    ),
    (
        Category::Ds,
        3,
        "Best DS for LIFO?",
        &["Stack", "Queue", "Deque", "List"],
        "Stack",
    ),
    (
        Category::Concept,
        3,
        "Difference between deep copy and shallow copy?",
        &[
            "Both same",
            "Shallow copies objects only",
            "Deep copies nested objects",
            "Shallow copies everything",
        ],
        "Deep copies nested objects",
    ),
    (
        Category::Tracing,
        3,
        "print(2**3**2)",
        &["512", "64", "256", "Error"],
        "512",
    ),
    (
        Category::Debug,
        3,
        "x = [1,2,3]\nx[3]",
        &["3", "Error", "None", "0"],
        "Error",
    ),
    (
        Category::Ds,
        3,
        "Time complexity of dict lookup?",
        &["O(1)", "O(n)", "O(log n)", "O(n^2)"],
        "O(1)",
    ),
    (
        Category::Concept,
        3,
        "Mutable types in Python?",
        &["List, Dict, Set", "Tuple, List", "All", "None"],
        "List, Dict, Set",
    ),
    (
        Category::Tracing,
        3,
        "print([i for i in range(3)])",
        &["0 1 2", "[0,1,2]", "Error", "[1,2,3]"],
        "[0,1,2]",
    ),
    (
        Category::Debug,
        3,
        "x = 10\ny = 0\nprint(x/y)",
        &["Error", "0", "10", "None"],
        "Error",
    ),
    (
        Category::Ds,
        3,
        "Which DS is unordered and mutable?",
        &["List", "Tuple", "Dict", "String"],
        "Dict",
    ),
    (
        Category::Concept,
        3,
        "Python functions are first-class objects?",
        &["Yes", "No"],
        "Yes",
    ),
    (
        Category::Tracing,
        3,
        "a = [1,2]\nb = a*2\nprint(b)",
        &["[1,2,1,2]", "[1,2,2]", "Error", "[1,1,2,2]"],
        "[1,2,1,2]",
    ),
    (
        Category::Debug,
        3,
        "print('Hello' / 2)",
        &["Error", "Hello2", "'Hello2'", "None"],
        "Error",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_bank_is_valid() {
        assert_eq!(QuestionBank::builtin().unwrap().size(), BUILTIN.len());
        assert_eq!(BUILTIN.len(), 26);
    }

    #[test]
    fn test_declaration_order_is_stable() {
        let first = QuestionBank::builtin().unwrap();
        let second = QuestionBank::builtin().unwrap();
        let q0 = first.item_at(0).unwrap();
        assert_eq!(q0, second.item_at(0).unwrap());
        assert_eq!(q0.category(), Category::Tracing);
        assert_eq!(q0.correct_answer(), "[1,2,3,4]");
        assert_eq!(
            first.item_at(25).unwrap().prompt(),
            "print('Hello' / 2)"
        );
    }

    #[test]
    fn test_invalid_table_entry_fails_the_whole_bank() {
        let table: &[BuiltinItem] = &[
            (Category::Ds, 2, "LIFO?", &["Stack", "Queue"], "Stack"),
            (Category::Concept, 1, "end of list", &["append()", "pop()"], "append"),
        ];
        assert!(matches!(
            QuestionBank::from_table(table),
            Err(BankError::InvalidQuestion(_))
        ));
    }

    #[test]
    fn test_item_at_out_of_range() {
        let bank = QuestionBank::builtin().unwrap();
        assert_eq!(
            bank.item_at(26),
            Err(QuizError::OutOfRange { index: 26, size: 26 })
        );
    }

    #[test]
    fn test_empty_bank_rejected() {
        assert!(matches!(QuestionBank::new(vec![]), Err(BankError::Empty)));
        assert!(matches!(QuestionBank::from_seeds(vec![]), Err(BankError::Empty)));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"type":"Debug","difficulty":2,"prompt":"print(1/0)","options":["Error","0"],"answer":"Error"}},
                {{"type":"Concept","difficulty":3,"prompt":"Is a tuple mutable?","options":["Yes","No"],"answer":"No"}}
            ]"#
        )
        .unwrap();

        let bank = QuestionBank::from_json_file(file.path()).unwrap();
        assert_eq!(bank.size(), 2);
        assert_eq!(bank.item_at(0).unwrap().difficulty(), 2);
        assert_eq!(bank.item_at(1).unwrap().correct_answer(), "No");
    }

    #[test]
    fn test_from_json_file_reports_bad_item() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"type":"DS","difficulty":3,"prompt":"Q","options":["add()","append()"],"answer":"append"}}]"#
        )
        .unwrap();

        match QuestionBank::from_json_file(file.path()) {
            Err(BankError::InvalidQuestion(msg)) => assert!(msg.starts_with("question 0")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
