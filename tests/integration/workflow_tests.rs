use std::sync::Arc;

use serde_json::json;
use velo_client::memory::{Endpoint, MemoryTransport};
use velo_client::{CacheKey, Gated, SessionSnapshot, SessionState, Velo};
use velo_core::credentials::LoginForm;
use velo_core::form::GoalForm;
use velo_core::order::is_display_ordered;
use velo_core::{GoalStatus, GoalType, Priority};

fn signed_in() -> (Arc<MemoryTransport>, Velo) {
    let transport = Arc::new(MemoryTransport::new().signed_in("Ada", "ada@example.com"));
    let velo = Velo::with_transport(transport.clone());
    (transport, velo)
}

// === Test 1: Task titles are trimmed before they reach the server ===
#[tokio::test]
async fn test_task_title_trimmed_end_to_end() {
    let (transport, velo) = signed_in();
    let goal = transport.seed_goal("Ship it", GoalType::Exploration).unwrap();

    let task = velo
        .tasks()
        .create("  Write report  ", Some(&goal))
        .await
        .unwrap();
    assert_eq!(task.title, "Write report");
    assert_eq!(task.user_priority, Priority::Medium);

    let sent = transport.calls_to(Endpoint::CreateTask);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body.as_ref().unwrap()["title"], json!("Write report"));
    assert_eq!(sent[0].body.as_ref().unwrap()["user_priority"], json!(2));

    transport.clear_calls();
    let err = velo.tasks().create("   ", Some(&goal)).await.unwrap_err();
    assert!(err.is_validation());
    assert!(transport.calls().is_empty());
}

// === Test 2: A 401 identity probe resolves to a signed-out snapshot ===
#[tokio::test]
async fn test_unauthorized_probe_snapshot() {
    let transport = Arc::new(MemoryTransport::new());
    let velo = Velo::with_transport(transport.clone());

    assert_eq!(velo.session().state(), SessionState::Loading);
    assert_eq!(velo.session().gate(|u| u.email.clone()), Gated::Loading);

    assert!(velo.session().probe().await.is_none());
    assert_eq!(
        velo.session().snapshot(),
        SessionSnapshot {
            user: None,
            is_authenticated: false,
            is_loading: false,
        }
    );
    assert_eq!(
        velo.session().gate(|u| u.email.clone()),
        Gated::Unauthenticated
    );

    // Resolved once; a second probe does not hit the server again.
    velo.session().probe().await;
    assert_eq!(transport.calls_to(Endpoint::Me).len(), 1);
}

// === Test 3: Habit payload never leaks a deadline ===
#[tokio::test]
async fn test_habit_goal_payload() {
    let (transport, velo) = signed_in();
    let mut form = GoalForm {
        title: "Run".to_string(),
        description: String::new(),
        goal_type: Some(GoalType::Habit),
        deadline: Some("2026-01-01".to_string()),
        frequency: Some(3),
    };

    let goal = velo.goals().create(&mut form).await.unwrap();
    assert_eq!(goal.frequency, Some(3));
    assert_eq!(goal.deadline, None);
    assert_eq!(form, GoalForm::default());

    let sent = transport.calls_to(Endpoint::CreateGoal);
    let body = sent[0].body.as_ref().unwrap();
    assert_eq!(body["goal_type"], json!("habit"));
    assert_eq!(body["frequency"], json!(3));
    assert!(body.get("deadline").is_none());
}

// === Test 4: Deadline payload is midnight UTC of the chosen date ===
#[tokio::test]
async fn test_deadline_goal_payload() {
    let (transport, velo) = signed_in();
    let mut form = GoalForm {
        title: "Launch".to_string(),
        description: "v1 out the door".to_string(),
        goal_type: Some(GoalType::Deadline),
        deadline: Some("2026-06-01".to_string()),
        frequency: Some(5),
    };

    let goal = velo.goals().create(&mut form).await.unwrap();
    assert_eq!(
        goal.deadline.unwrap().to_rfc3339(),
        "2026-06-01T00:00:00+00:00"
    );

    let sent = transport.calls_to(Endpoint::CreateGoal);
    let body = sent[0].body.as_ref().unwrap();
    assert_eq!(body["deadline"], json!("2026-06-01T00:00:00Z"));
    assert_eq!(body["description"], json!("v1 out the door"));
    assert!(body.get("frequency").is_none());
}

// === Test 5: A rejected goal keeps the form input ===
#[tokio::test]
async fn test_rejected_goal_keeps_form() {
    let (transport, velo) = signed_in();
    let mut form = GoalForm {
        title: "Read more".to_string(),
        goal_type: Some(GoalType::Habit),
        ..GoalForm::default()
    };

    let err = velo.goals().create(&mut form).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(form.title, "Read more");
    assert_eq!(transport.calls_to(Endpoint::CreateGoal).len(), 1);
}

// === Test 6: Completion toggles send the negated state ===
#[tokio::test]
async fn test_complete_toggles() {
    let (transport, velo) = signed_in();
    let goal = transport.seed_goal("Fitness", GoalType::Habit).unwrap();
    let task = transport
        .seed_task(Some(&goal), "Stretch", Priority::Low, false)
        .unwrap();

    velo.tasks().complete(&task, false).await.unwrap();
    assert!(transport.task(&task).unwrap().is_completed);

    velo.tasks().complete(&task, true).await.unwrap();
    assert!(!transport.task(&task).unwrap().is_completed);

    let bodies: Vec<_> = transport
        .calls_to(Endpoint::CompleteTask)
        .into_iter()
        .map(|c| c.body.unwrap())
        .collect();
    assert_eq!(
        bodies,
        vec![json!({ "is_completed": true }), json!({ "is_completed": false })]
    );
}

// === Test 7: Goal list fails soft, task writes fail hard ===
#[tokio::test]
async fn test_soft_reads_hard_writes() {
    let (transport, velo) = signed_in();
    let goal = transport.seed_goal("Garden", GoalType::Exploration).unwrap();

    transport.fail(Endpoint::ListGoals, 500, "database unavailable");
    assert!(velo.goals().list().await.is_empty());
    assert!(velo.goals().try_list().await.is_err());

    transport.fail(Endpoint::CreateTask, 500, "database unavailable");
    let err = velo.tasks().create("Plant beans", Some(&goal)).await.unwrap_err();
    assert_eq!(err.status(), Some(500));

    transport.fail(Endpoint::ListTasks, 500, "database unavailable");
    assert!(velo.tasks().list(None).await.is_err());

    transport.recover(Endpoint::ListGoals);
    transport.recover(Endpoint::CreateTask);
    transport.recover(Endpoint::ListTasks);
    assert_eq!(velo.goals().list().await.len(), 1);
    assert!(velo.tasks().list(None).await.unwrap().is_empty());
}

// === Test 8: Task writes refresh goal progress ===
#[tokio::test]
async fn test_progress_follows_task_writes() {
    let (transport, velo) = signed_in();
    let mut form = GoalForm {
        title: "Learn Spanish".to_string(),
        goal_type: Some(GoalType::Exploration),
        ..GoalForm::default()
    };
    let goal = velo.goals().create(&mut form).await.unwrap();
    assert_eq!(goal.progress_ratio(), 0.0);

    let listed = velo.goals().list().await;
    assert_eq!(listed[0].progress_ratio(), 0.0);
    assert!(velo.cache().contains(&CacheKey::Goals));

    let first = velo.tasks().create("Lesson 1", Some(&goal.id)).await.unwrap();
    velo.tasks().create("Lesson 2", Some(&goal.id)).await.unwrap();
    velo.tasks().complete(&first.id, false).await.unwrap();
    assert!(!velo.cache().contains(&CacheKey::Goals));

    let listed = velo.goals().list().await;
    assert_eq!(listed[0].total_tasks, 2);
    assert_eq!(listed[0].completed_tasks, 1);
    assert_eq!(listed[0].progress_ratio(), 0.5);
    assert_eq!(listed[0].progress_percent(), 50);
}

// === Test 9: Task lists come back in display order ===
#[tokio::test]
async fn test_task_list_display_order() {
    let (transport, velo) = signed_in();
    let goal = transport.seed_goal("House", GoalType::Exploration).unwrap();
    transport.seed_task(Some(&goal), "Paint", Priority::Low, false).unwrap();
    transport.seed_task(Some(&goal), "Roof", Priority::High, true).unwrap();
    transport.seed_task(Some(&goal), "Plumbing", Priority::High, false).unwrap();
    transport.seed_task(Some(&goal), "Windows", Priority::Medium, false).unwrap();
    transport.seed_task(None, "Taxes", Priority::Low, true).unwrap();

    let tasks = velo.tasks().list(None).await.unwrap();
    let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Plumbing", "Windows", "Paint", "Roof", "Taxes"]);
    assert!(is_display_ordered(&tasks));

    let scoped = velo.tasks().list(Some(&goal)).await.unwrap();
    assert_eq!(scoped.len(), 4);
    assert_eq!(
        transport.calls_to(Endpoint::ListTasks)[1].target.as_deref(),
        Some(goal.as_str())
    );
}

// === Test 10: Login swaps the session and drops cached data ===
#[tokio::test]
async fn test_login_logout_cycle() {
    let transport = Arc::new(
        MemoryTransport::new().with_account("Grace", "grace@example.com", "hopper-1906"),
    );
    let velo = Velo::with_transport(transport.clone());

    assert!(velo.session().probe().await.is_none());
    assert!(velo.goals().list().await.is_empty());

    let err = velo
        .auth()
        .login(LoginForm::new("grace@example.com", "wrong-password"))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());

    let outcome = velo
        .auth()
        .login(LoginForm::new("grace@example.com", "hopper-1906"))
        .await
        .unwrap();
    assert!(outcome.session_cookie.is_some());
    assert_eq!(velo.session().state(), SessionState::Loading);

    let user = velo.session().probe().await.unwrap();
    assert_eq!(user.email, "grace@example.com");
    assert_eq!(velo.session().gate(|u| u.name.clone()).granted().as_deref(), Some("Grace"));

    velo.auth().logout();
    assert_eq!(velo.session().state(), SessionState::Loading);
    assert!(velo.session().probe().await.is_none());
}

// === Test 11: Deleting a goal abandons it ===
#[tokio::test]
async fn test_delete_goal_abandons() {
    let (transport, velo) = signed_in();
    let goal = transport.seed_goal("Old plan", GoalType::Exploration).unwrap();

    assert_eq!(velo.goals().list().await[0].status, GoalStatus::NotStarted);
    velo.goals().delete(&goal).await.unwrap();

    let found = velo.goals().find(&goal).await.unwrap().unwrap();
    assert_eq!(found.status, GoalStatus::Abandoned);
    assert_eq!(transport.goal(&goal).unwrap().status, GoalStatus::Abandoned);
    assert_eq!(transport.calls_to(Endpoint::ListGoals).len(), 2);
}

// === Test 12: Tasks without a goal are rejected by the server ===
#[tokio::test]
async fn test_goalless_task_rejected() {
    let (transport, velo) = signed_in();

    let err = velo.tasks().create("Orphan", None).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    let sent = transport.calls_to(Endpoint::CreateTask);
    assert!(sent[0].body.as_ref().unwrap().get("goal_id").is_none());
    assert!(velo.tasks().list(None).await.unwrap().is_empty());
}
