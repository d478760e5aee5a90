use std::collections::HashSet;

use skillstar_queue::{ProgressReporter, TaskRequest, TaskTargets};

use super::*;
use crate::catalog::{CatalogData, MemoryCatalog};
use crate::error::CatalogError;
use crate::model::{HistoryEntry, HistoryStatus, Student};
use crate::testing::{Call, FakeMenuRow, FakePage, FakeSection, FakeSkill, FakeTree};

fn student(id: &str, name: &str) -> Student {
    Student {
        id: id.to_string(),
        name: name.to_string(),
        default_grade: None,
        default_subject: None,
    }
}

fn skill(id: &str, code: &str, name: &str, subject: &str, grade: &str) -> SkillDescriptor {
    SkillDescriptor {
        id: id.to_string(),
        skill_code: code.to_string(),
        external_id: None,
        display_name: name.to_string(),
        clean_name: String::new(),
        subject: subject.to_string(),
        grade_level: grade.to_string(),
    }
}

fn catalog() -> CatalogData {
    CatalogData {
        students: vec![
            student("s1", "Ana"),
            student("s2", "Ben"),
            student("s3", "Cy"),
            student("s4", "Dee"),
            student("s5", "Alex Kim"),
            student("s6", "Alex Kim"),
        ],
        skills: vec![
            skill("sk1", "A.1", "Count to 10", "math", "3"),
            skill("sk2", "A.2", "Subtract", "math", "3"),
            skill("sk3", "A.3", "Skip-counting", "math", "3"),
            skill("sk7", "A.1", "Count to 100", "math", "4"),
            skill("sk5", "R.5", "Main idea", "sat", "12"),
            SkillDescriptor {
                external_id: Some("ext-42".to_string()),
                ..skill("sk6", "R.2", "Inference", "sat", "12")
            },
        ],
        groups: vec![
            Group {
                name: "Period 1".to_string(),
                member_ids: vec!["s1".to_string(), "s2".to_string(), "s3".to_string()],
                is_native_class: true,
            },
            Group {
                name: "Reading club".to_string(),
                member_ids: vec!["s3".to_string()],
                is_native_class: false,
            },
        ],
    }
}

fn counting_page(menu: Vec<FakeMenuRow>) -> FakePage {
    FakePage::category(vec![FakeSection::new(
        "A. Counting",
        vec![
            FakeSkill::new("Count to 10").number("1").menu(menu.clone()),
            FakeSkill::new("Skip-counting").number("3").menu(menu),
        ],
    )])
}

fn task(student_ids: &[&str], group_names: &[&str], skill_ids: &[&str], action: SuggestAction) -> Task {
    Task::new(TaskRequest::new(
        TaskTargets {
            student_ids: student_ids.iter().map(|s| s.to_string()).collect(),
            group_names: group_names.iter().map(|s| s.to_string()).collect(),
        },
        skill_ids.iter().map(|s| s.to_string()).collect(),
        action,
    ))
}

struct Fixture {
    tree: Arc<FakeTree>,
    catalog: Arc<MemoryCatalog>,
    handler: AssignmentHandler,
}

fn fixture(tree: FakeTree) -> Fixture {
    let tree = Arc::new(tree);
    let catalog = Arc::new(MemoryCatalog::new(catalog()));
    let handler = AssignmentHandler::new(tree.clone(), catalog.clone(), &Config::default());
    Fixture {
        tree,
        catalog,
        handler,
    }
}

fn ctx() -> TaskContext {
    TaskContext::new(CancellationToken::new(), ProgressReporter::noop())
}

#[tokio::test]
async fn test_only_off_targets_are_clicked() {
    let f = fixture(FakeTree::new(counting_page(vec![
        FakeMenuRow::new("Ana").on(),
        FakeMenuRow::new("Ben"),
    ])));

    let outcome = f
        .handler
        .handle(&task(&["s1", "s2"], &[], &["sk1"], SuggestAction::Suggest), ctx())
        .await
        .unwrap();

    assert!(!outcome.aborted);
    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results.iter().all(|r| r.success));
    assert_eq!(f.tree.clicks(), vec!["mrow:1/toggle".to_string()]);
    assert_eq!(
        f.tree.calls().first(),
        Some(&Call::Navigate("https://learning.example.com/math/3".to_string()))
    );

    let history = f.catalog.history();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|e| e.status == HistoryStatus::Success));
    let batches: HashSet<Uuid> = history.iter().map(|e| e.batch_id).collect();
    assert_eq!(batches.len(), 1);

    let ana = f.catalog.student("s1").unwrap();
    assert_eq!(ana.default_grade.as_deref(), Some("3"));
    assert_eq!(ana.default_subject.as_deref(), Some("math"));
}

#[tokio::test]
async fn test_plan_skill_resolved_by_name_in_its_section() {
    let page = FakePage::plan(vec![
        FakeSection::new(
            "Math",
            vec![FakeSkill::new("Main idea").menu(vec![FakeMenuRow::new("Ana")])],
        ),
        FakeSection::new(
            "Reading and Writing",
            vec![
                FakeSkill::new("Vocabulary in context").menu(vec![FakeMenuRow::new("Ana")]),
                FakeSkill::new("Main idea").menu(vec![FakeMenuRow::new("Ana")]),
            ],
        ),
    ]);
    let f = fixture(FakeTree::new(page));

    let outcome = f
        .handler
        .handle(&task(&["s1"], &[], &["sk5"], SuggestAction::Suggest), ctx())
        .await
        .unwrap();

    assert!(outcome.results[0].success);
    assert!(f.tree.is_on(2, "Ana"));
    assert!(!f.tree.is_on(0, "Ana"));
    assert!(!f.tree.is_on(1, "Ana"));
    assert_eq!(
        f.tree.calls().first(),
        Some(&Call::Navigate("https://learning.example.com/sat/skill-plans".to_string()))
    );
}

#[tokio::test]
async fn test_plan_skill_resolved_by_external_id() {
    let page = FakePage::plan(vec![FakeSection::new(
        "Reading",
        vec![
            FakeSkill::new("Inference").menu(vec![FakeMenuRow::new("Ana")]),
            FakeSkill::new("Drawing inferences")
                .external_id("ext-42")
                .menu(vec![FakeMenuRow::new("Ana")]),
        ],
    )]);
    let f = fixture(FakeTree::new(page));

    let outcome = f
        .handler
        .handle(&task(&["s1"], &[], &["sk6"], SuggestAction::Suggest), ctx())
        .await
        .unwrap();

    assert!(outcome.results[0].success);
    assert!(f.tree.is_on(1, "Ana"));
    assert!(!f.tree.is_on(0, "Ana"));
}

#[tokio::test]
async fn test_cancelled_before_start_touches_nothing() {
    let f = fixture(FakeTree::new(counting_page(vec![FakeMenuRow::new("Ana")])));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = f
        .handler
        .handle(
            &task(&["s1"], &[], &["sk1"], SuggestAction::Suggest),
            TaskContext::new(cancel, ProgressReporter::noop()),
        )
        .await
        .unwrap();

    assert!(outcome.aborted);
    assert!(outcome.results.is_empty());
    assert!(f.tree.calls().is_empty());
    assert!(f.catalog.history().is_empty());
}

/// Raises the token the moment setup asks for groups.
struct CancellingCatalog {
    inner: MemoryCatalog,
    cancel: CancellationToken,
}

#[async_trait]
impl Catalog for CancellingCatalog {
    async fn students_by_ids(&self, ids: &[String]) -> Result<Vec<Student>, CatalogError> {
        self.inner.students_by_ids(ids).await
    }

    async fn skills_by_ids(&self, ids: &[String]) -> Result<Vec<SkillDescriptor>, CatalogError> {
        self.inner.skills_by_ids(ids).await
    }

    async fn groups(&self) -> Result<Vec<Group>, CatalogError> {
        self.cancel.cancel();
        self.inner.groups().await
    }

    async fn record_history(&self, entry: &HistoryEntry) -> Result<(), CatalogError> {
        self.inner.record_history(entry).await
    }

    async fn update_student_defaults(
        &self,
        student_id: &str,
        grade: &str,
        subject: &str,
    ) -> Result<(), CatalogError> {
        self.inner
            .update_student_defaults(student_id, grade, subject)
            .await
    }
}

#[tokio::test]
async fn test_cancelled_during_setup_touches_no_page() {
    let cancel = CancellationToken::new();
    let tree = Arc::new(FakeTree::new(counting_page(vec![FakeMenuRow::new("Ana")])));
    let catalog = Arc::new(CancellingCatalog {
        inner: MemoryCatalog::new(catalog()),
        cancel: cancel.clone(),
    });
    let handler = AssignmentHandler::new(tree.clone(), catalog.clone(), &Config::default());

    let outcome = handler
        .handle(
            &task(&["s1"], &[], &["sk1"], SuggestAction::Suggest),
            TaskContext::new(cancel, ProgressReporter::noop()),
        )
        .await
        .unwrap();

    assert!(outcome.aborted);
    assert!(outcome.results.is_empty());
    assert!(tree.calls().is_empty());
    assert!(catalog.inner.history().is_empty());
}

#[tokio::test]
async fn test_setup_fails_without_valid_students() {
    let f = fixture(FakeTree::new(counting_page(vec![FakeMenuRow::new("Ana")])));

    let err = f
        .handler
        .handle(&task(&["ghost"], &["No such group"], &["sk1"], SuggestAction::Suggest), ctx())
        .await
        .unwrap_err();

    assert!(matches!(err, QueueError::Setup(reason) if reason == "no valid students or groups"));
    assert!(f.tree.calls().is_empty());
}

#[tokio::test]
async fn test_setup_fails_without_valid_skills() {
    let f = fixture(FakeTree::new(counting_page(vec![FakeMenuRow::new("Ana")])));

    let err = f
        .handler
        .handle(&task(&["s1"], &[], &["nope"], SuggestAction::Suggest), ctx())
        .await
        .unwrap_err();

    assert!(matches!(err, QueueError::Setup(reason) if reason == "no valid skills"));
    assert!(f.catalog.history().is_empty());
}

#[tokio::test]
async fn test_skill_failure_does_not_stop_the_batch() {
    let f = fixture(FakeTree::new(counting_page(vec![
        FakeMenuRow::new("Ana"),
        FakeMenuRow::new("Ben"),
    ])));

    let outcome = f
        .handler
        .handle(
            &task(&["s1", "s2"], &[], &["sk2", "sk1"], SuggestAction::Suggest),
            ctx(),
        )
        .await
        .unwrap();

    assert!(!outcome.aborted);
    assert_eq!(outcome.results.len(), 4);
    for record in &outcome.results[..2] {
        assert_eq!(record.skill_code, "A.2");
        assert!(!record.success);
        assert_eq!(record.error.as_deref(), Some("skill not found: A.2"));
    }
    assert!(outcome.results[2..].iter().all(|r| r.success && r.skill_code == "A.1"));
    assert!(f.tree.is_on(0, "Ana"));
    assert!(f.tree.is_on(0, "Ben"));

    let failed = f
        .catalog
        .history()
        .iter()
        .filter(|e| e.status == HistoryStatus::Failed)
        .count();
    assert_eq!(failed, 2);
}

#[tokio::test]
async fn test_same_page_is_loaded_once() {
    let f = fixture(FakeTree::new(counting_page(vec![FakeMenuRow::new("Ana")])));

    let outcome = f
        .handler
        .handle(&task(&["s1"], &[], &["sk1", "sk3"], SuggestAction::Suggest), ctx())
        .await
        .unwrap();

    assert!(outcome.results.iter().all(|r| r.success));
    assert_eq!(f.tree.count(|c| matches!(c, Call::Navigate(_))), 1);
    assert!(f.tree.is_on(0, "Ana"));
    assert!(f.tree.is_on(1, "Ana"));
}

#[tokio::test]
async fn test_navigation_failure_fails_each_target() {
    let f = fixture(FakeTree::new(counting_page(vec![FakeMenuRow::new("Ana")])).failing_navigation());

    let outcome = f
        .handler
        .handle(&task(&["s1"], &[], &["sk1", "sk3"], SuggestAction::Suggest), ctx())
        .await
        .unwrap();

    assert!(!outcome.aborted);
    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results.iter().all(|r| !r.success));
    assert_eq!(f.tree.count(|c| matches!(c, Call::Navigate(_))), 2);
}

#[tokio::test]
async fn test_class_result_fans_out_to_members() {
    let f = fixture(FakeTree::new(counting_page(vec![
        FakeMenuRow::new("Period 1"),
        FakeMenuRow::new("Dee"),
    ])));

    let outcome = f
        .handler
        .handle(
            &task(&["s1", "s4"], &["Period 1"], &["sk1"], SuggestAction::Suggest),
            ctx(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results[0].is_class_target);
    assert_eq!(outcome.results[0].target_name, "Period 1");
    assert_eq!(outcome.results[1].target_name, "Dee");

    let history = f.catalog.history();
    let mut covered: Vec<(&str, Option<&str>)> = history
        .iter()
        .map(|e| (e.student_id.as_str(), e.group_name.as_deref()))
        .collect();
    covered.sort();
    assert_eq!(
        covered,
        vec![
            ("s1", Some("Period 1")),
            ("s2", Some("Period 1")),
            ("s3", Some("Period 1")),
            ("s4", None),
        ]
    );
}

#[tokio::test]
async fn test_local_group_members_become_individuals() {
    let f = fixture(FakeTree::new(counting_page(vec![
        FakeMenuRow::new("Ana"),
        FakeMenuRow::new("Cy"),
    ])));

    let outcome = f
        .handler
        .handle(
            &task(&["s1"], &["Reading club"], &["sk1"], SuggestAction::Suggest),
            ctx(),
        )
        .await
        .unwrap();

    let names: Vec<&str> = outcome.results.iter().map(|r| r.target_name.as_str()).collect();
    assert_eq!(names, vec!["Ana", "Cy"]);
    assert!(outcome.results.iter().all(|r| !r.is_class_target));

    let cy = f
        .catalog
        .history()
        .into_iter()
        .find(|e| e.student_id == "s3")
        .unwrap();
    assert_eq!(cy.group_name.as_deref(), Some("Reading club"));
}

#[tokio::test]
async fn test_progress_stays_within_total() {
    let f = fixture(FakeTree::new(counting_page(vec![FakeMenuRow::new("Ana")])));
    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();
    let ctx = TaskContext::new(
        CancellationToken::new(),
        ProgressReporter::new(move |u| sink.lock().push(u)),
    );

    f.handler
        .handle(&task(&["s1"], &[], &["sk1", "sk3"], SuggestAction::Suggest), ctx)
        .await
        .unwrap();

    let updates = updates.lock();
    assert_eq!(updates.len(), 2);
    assert!(updates.iter().all(|u| u.current <= u.total && u.total == 2));
    assert_eq!(updates[0].current_skill_label, "A.1 Count to 10");
    assert_eq!(updates[1].current, 2);
}

#[tokio::test]
async fn test_abort_between_skills_keeps_finished_ones() {
    let f = fixture(FakeTree::new(counting_page(vec![FakeMenuRow::new("Ana")])));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let ctx = TaskContext::new(
        cancel,
        ProgressReporter::new(move |u| {
            if u.current == 1 {
                trigger.cancel();
            }
        }),
    );

    let outcome = f
        .handler
        .handle(&task(&["s1"], &[], &["sk1", "sk3"], SuggestAction::Suggest), ctx)
        .await
        .unwrap();

    assert!(outcome.aborted);
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].skill_code, "A.1");
    assert!(f.tree.is_on(0, "Ana"));
    assert!(!f.tree.is_on(1, "Ana"));
    assert_eq!(f.catalog.history().len(), 1);
}

#[tokio::test]
async fn test_unsuggest_turns_stars_off() {
    let f = fixture(FakeTree::new(counting_page(vec![
        FakeMenuRow::new("Ana").on(),
        FakeMenuRow::new("Ben"),
    ])));

    let outcome = f
        .handler
        .handle(&task(&["s1", "s2"], &[], &["sk1"], SuggestAction::Unsuggest), ctx())
        .await
        .unwrap();

    assert!(outcome.results.iter().all(|r| r.success));
    assert_eq!(f.tree.clicks(), vec!["mrow:0/toggle".to_string()]);
    assert!(!f.tree.is_on(0, "Ana"));
}

#[tokio::test]
async fn test_same_code_in_two_grades_records_each_skill() {
    let f = fixture(FakeTree::new(counting_page(vec![FakeMenuRow::new("Ana")])));

    let outcome = f
        .handler
        .handle(&task(&["s1"], &[], &["sk1", "sk7"], SuggestAction::Suggest), ctx())
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results.iter().all(|r| r.success && r.skill_code == "A.1"));
    let navigations: Vec<Call> = f
        .tree
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Navigate(_)))
        .collect();
    assert_eq!(
        navigations,
        vec![
            Call::Navigate("https://learning.example.com/math/3".to_string()),
            Call::Navigate("https://learning.example.com/math/4".to_string()),
        ]
    );

    let skill_ids: Vec<String> = f.catalog.history().into_iter().map(|e| e.skill_id).collect();
    assert_eq!(skill_ids, vec!["sk1".to_string(), "sk7".to_string()]);

    let ana = f.catalog.student("s1").unwrap();
    assert_eq!(ana.default_grade.as_deref(), Some("4"));
}

#[tokio::test]
async fn test_students_sharing_a_name_each_get_history() {
    let f = fixture(FakeTree::new(counting_page(vec![FakeMenuRow::new("Alex Kim")])));

    let outcome = f
        .handler
        .handle(&task(&["s5", "s6"], &[], &["sk1"], SuggestAction::Suggest), ctx())
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results.iter().all(|r| r.success));
    assert_eq!(f.tree.clicks().len(), 1);

    let mut students: Vec<String> = f.catalog.history().into_iter().map(|e| e.student_id).collect();
    students.sort();
    assert_eq!(students, vec!["s5".to_string(), "s6".to_string()]);
}
