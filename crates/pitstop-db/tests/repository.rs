use pitstop_core::MECHANIC_ROSTER;
use pitstop_db::{CarChanges, Database, NewCar, NewTask, TaskChanges, TaskFilter};

async fn setup_db() -> Database {
    let db = Database::in_memory().await.unwrap();
    db.init_schema().await.unwrap();
    db.seed_mechanics(MECHANIC_ROSTER).await.unwrap();
    db
}

fn corolla() -> NewCar {
    NewCar {
        brand: "Toyota".to_string(),
        model: "Corolla".to_string(),
        year: 2020,
        repair_time: None,
        start_date: None,
    }
}

fn task_for(car_id: i64, title: &str, points: i64) -> NewTask {
    NewTask {
        car_id,
        title: title.to_string(),
        description: None,
        assigned_mechanic: None,
        points,
    }
}

fn set_status(status: &str) -> TaskChanges {
    TaskChanges {
        status: Some(status.to_string()),
        ..Default::default()
    }
}

fn complete_as(mechanic: &str) -> TaskChanges {
    TaskChanges {
        status: Some("completed".to_string()),
        assigned_mechanic: Some(Some(mechanic.to_string())),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let db = setup_db().await;
    db.seed_mechanics(MECHANIC_ROSTER).await.unwrap();

    let mechanics = db.list_mechanics().await.unwrap();
    assert_eq!(mechanics.len(), MECHANIC_ROSTER.len());
    assert!(mechanics.iter().all(|m| m.total_points == 0 && m.total_tasks == 0));
}

#[tokio::test]
async fn test_create_and_get_car() {
    let db = setup_db().await;

    let car = db.create_car(&corolla()).await.unwrap();
    assert_eq!(car.brand, "Toyota");
    assert_eq!(car.status, "pending");

    let fetched = db.get_car(car.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, car.id);
    assert_eq!(fetched.model, "Corolla");

    assert!(db.get_car(car.id + 100).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_car_merges_and_clears_fields() {
    let db = setup_db().await;
    let car = db.create_car(&corolla()).await.unwrap();

    let updated = db
        .update_car(
            car.id,
            &CarChanges {
                repair_time: Some(Some("2-3 hours".to_string())),
                status: Some("in_progress".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.brand, "Toyota");
    assert_eq!(updated.repair_time.as_deref(), Some("2-3 hours"));
    assert_eq!(updated.status, "in_progress");

    // An explicit null clears a nullable field
    let cleared = db
        .update_car(
            car.id,
            &CarChanges {
                repair_time: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cleared.repair_time, None);
    assert_eq!(cleared.status, "in_progress");
}

#[tokio::test]
async fn test_list_cars_filters_by_status() {
    let db = setup_db().await;
    let first = db.create_car(&corolla()).await.unwrap();
    let second = db.create_car(&corolla()).await.unwrap();
    db.update_car(second.id, &CarChanges {
        status: Some("delivered".to_string()),
        ..Default::default()
    })
    .await
    .unwrap();

    let pending = db.list_cars(Some("pending")).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, first.id);

    let all = db.list_cars(None).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_create_task_requires_existing_car() {
    let db = setup_db().await;

    let err = db.create_task(&task_for(42, "Oil change", 1)).await.unwrap_err();
    assert!(matches!(err, pitstop_db::Error::CarMissing));

    let tasks = db.list_tasks(&TaskFilter::default()).await.unwrap();
    assert!(tasks.is_empty());
}

#[tokio::test]
async fn test_task_join_carries_car_fields() {
    let db = setup_db().await;
    let car = db.create_car(&corolla()).await.unwrap();
    let task = db.create_task(&task_for(car.id, "Oil change", 3)).await.unwrap();

    assert_eq!(task.brand.as_deref(), Some("Toyota"));
    assert_eq!(task.model.as_deref(), Some("Corolla"));
    assert_eq!(task.year, Some(2020));
    assert_eq!(task.points, 3);
    assert_eq!(task.status, "pending");
}

#[tokio::test]
async fn test_list_tasks_filters() {
    let db = setup_db().await;
    let car_a = db.create_car(&corolla()).await.unwrap();
    let car_b = db.create_car(&corolla()).await.unwrap();
    let task_a = db.create_task(&task_for(car_a.id, "Brakes", 2)).await.unwrap();
    db.create_task(&task_for(car_b.id, "Tires", 1)).await.unwrap();
    db.update_task(task_a.id, &set_status("in_progress")).await.unwrap();

    let by_car = db
        .list_tasks(&TaskFilter {
            car_id: Some(car_a.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_car.len(), 1);
    assert_eq!(by_car[0].title, "Brakes");

    let by_status = db
        .list_tasks(&TaskFilter {
            status: Some("in_progress".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_status.len(), 1);
    assert_eq!(by_status[0].id, task_a.id);

    let both = db
        .list_tasks(&TaskFilter {
            status: Some("pending".to_string()),
            car_id: Some(car_a.id),
        })
        .await
        .unwrap();
    assert!(both.is_empty());
}

#[tokio::test]
async fn test_completion_round_trip_restores_scores() {
    let db = setup_db().await;
    let car = db.create_car(&corolla()).await.unwrap();
    let task = db.create_task(&task_for(car.id, "Oil change", 3)).await.unwrap();

    let completed = db
        .update_task(task.id, &complete_as("ChristianCobra"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(completed.status, "completed");
    assert!(completed.completed_at.is_some());

    let mechanic = db.get_mechanic("ChristianCobra").await.unwrap().unwrap();
    assert_eq!(mechanic.total_points, 3);
    assert_eq!(mechanic.total_tasks, 1);

    let reopened = db
        .update_task(task.id, &set_status("pending"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reopened.status, "pending");
    assert!(reopened.completed_at.is_none());

    let mechanic = db.get_mechanic("ChristianCobra").await.unwrap().unwrap();
    assert_eq!(mechanic.total_points, 0);
    assert_eq!(mechanic.total_tasks, 0);
}

#[tokio::test]
async fn test_completing_unassigned_task_scores_nobody() {
    let db = setup_db().await;
    let car = db.create_car(&corolla()).await.unwrap();
    let task = db.create_task(&task_for(car.id, "Inspection", 5)).await.unwrap();

    db.update_task(task.id, &set_status("completed")).await.unwrap();

    let mechanics = db.list_mechanics().await.unwrap();
    assert!(mechanics.iter().all(|m| m.total_points == 0));
}

#[tokio::test]
async fn test_unchanged_status_does_not_rescore() {
    let db = setup_db().await;
    let car = db.create_car(&corolla()).await.unwrap();
    let task = db.create_task(&task_for(car.id, "Oil change", 3)).await.unwrap();
    db.update_task(task.id, &complete_as("Chicanto")).await.unwrap();

    // Same status again, points edited: no score movement
    db.update_task(
        task.id,
        &TaskChanges {
            status: Some("completed".to_string()),
            points: Some(7),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let mechanic = db.get_mechanic("Chicanto").await.unwrap().unwrap();
    assert_eq!(mechanic.total_points, 3);
    assert_eq!(mechanic.total_tasks, 1);
}

#[tokio::test]
async fn test_reassignment_with_reopen_reclaims_from_old_mechanic() {
    let db = setup_db().await;
    let car = db.create_car(&corolla()).await.unwrap();
    let task = db.create_task(&task_for(car.id, "Gearbox", 4)).await.unwrap();
    db.update_task(task.id, &complete_as("Chicanto")).await.unwrap();

    // One update: reopen and hand the task to someone else
    db.update_task(
        task.id,
        &TaskChanges {
            status: Some("pending".to_string()),
            assigned_mechanic: Some(Some("SpiderSteven".to_string())),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let old = db.get_mechanic("Chicanto").await.unwrap().unwrap();
    assert_eq!(old.total_points, 0);
    assert_eq!(old.total_tasks, 0);

    let new = db.get_mechanic("SpiderSteven").await.unwrap().unwrap();
    assert_eq!(new.total_points, 0);
    assert_eq!(new.total_tasks, 0);
}

#[tokio::test]
async fn test_points_sum_matches_completed_tasks() {
    let db = setup_db().await;
    let car = db.create_car(&corolla()).await.unwrap();

    let t1 = db.create_task(&task_for(car.id, "Oil change", 3)).await.unwrap();
    let t2 = db.create_task(&task_for(car.id, "Brakes", 5)).await.unwrap();
    let t3 = db.create_task(&task_for(car.id, "Tires", 2)).await.unwrap();

    db.update_task(t1.id, &complete_as("ChristianCobra")).await.unwrap();
    db.update_task(t2.id, &complete_as("Chicanto")).await.unwrap();
    db.update_task(t3.id, &complete_as("ChristianCobra")).await.unwrap();
    // Reopen one, delete another completed one
    db.update_task(t2.id, &set_status("in_progress")).await.unwrap();
    db.delete_task(t3.id).await.unwrap();

    let tasks = db.list_tasks(&TaskFilter::default()).await.unwrap();
    let completed_points: i64 = tasks
        .iter()
        .filter(|t| t.status == "completed" && t.assigned_mechanic.is_some())
        .map(|t| t.points)
        .sum();

    let mechanics = db.list_mechanics().await.unwrap();
    let total_awarded: i64 = mechanics.iter().map(|m| m.total_points).sum();

    assert_eq!(total_awarded, completed_points);
    assert_eq!(total_awarded, 3);
}

#[tokio::test]
async fn test_delete_completed_task_reclaims_points() {
    let db = setup_db().await;
    let car = db.create_car(&corolla()).await.unwrap();
    let task = db.create_task(&task_for(car.id, "Oil change", 3)).await.unwrap();
    db.update_task(task.id, &complete_as("PhonKing")).await.unwrap();

    assert!(db.delete_task(task.id).await.unwrap());
    assert!(db.get_task(task.id).await.unwrap().is_none());

    let mechanic = db.get_mechanic("PhonKing").await.unwrap().unwrap();
    assert_eq!(mechanic.total_points, 0);
    assert_eq!(mechanic.total_tasks, 0);
}

#[tokio::test]
async fn test_delete_missing_task_reports_false() {
    let db = setup_db().await;
    assert!(!db.delete_task(9000).await.unwrap());
}

#[tokio::test]
async fn test_delete_car_cascades_to_tasks() {
    let db = setup_db().await;
    let car = db.create_car(&corolla()).await.unwrap();
    let kept_car = db.create_car(&corolla()).await.unwrap();

    let doomed = db.create_task(&task_for(car.id, "Oil change", 3)).await.unwrap();
    db.update_task(doomed.id, &complete_as("LaBestiaPelua")).await.unwrap();
    db.create_task(&task_for(car.id, "Brakes", 2)).await.unwrap();
    let kept_task = db.create_task(&task_for(kept_car.id, "Tires", 1)).await.unwrap();

    assert!(db.delete_car(car.id).await.unwrap());

    // No orphans: only the other car's task remains
    let tasks = db.list_tasks(&TaskFilter::default()).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, kept_task.id);

    // Completed work on the deleted car no longer counts
    let mechanic = db.get_mechanic("LaBestiaPelua").await.unwrap().unwrap();
    assert_eq!(mechanic.total_points, 0);
    assert_eq!(mechanic.total_tasks, 0);
}

#[tokio::test]
async fn test_leaderboard_excludes_zero_scores_and_orders() {
    let db = setup_db().await;
    let car = db.create_car(&corolla()).await.unwrap();

    let t1 = db.create_task(&task_for(car.id, "A", 5)).await.unwrap();
    let t2 = db.create_task(&task_for(car.id, "B", 2)).await.unwrap();
    let t3 = db.create_task(&task_for(car.id, "C", 2)).await.unwrap();
    db.update_task(t1.id, &complete_as("SpiderSteven")).await.unwrap();
    db.update_task(t2.id, &complete_as("Chicanto")).await.unwrap();
    db.update_task(t3.id, &complete_as("ChristianCobra")).await.unwrap();

    let board = db.leaderboard(10).await.unwrap();
    assert_eq!(board.len(), 3);
    assert_eq!(board[0].name, "SpiderSteven");
    // Tie on 2 points resolves by name
    assert_eq!(board[1].name, "ChristianCobra");
    assert_eq!(board[2].name, "Chicanto");

    let capped = db.leaderboard(2).await.unwrap();
    assert_eq!(capped.len(), 2);
}

#[tokio::test]
async fn test_mechanic_recent_tasks_lists_completed_work() {
    let db = setup_db().await;
    let car = db.create_car(&corolla()).await.unwrap();

    let t1 = db.create_task(&task_for(car.id, "Oil change", 3)).await.unwrap();
    let t2 = db.create_task(&task_for(car.id, "Brakes", 2)).await.unwrap();
    db.update_task(t1.id, &complete_as("TurboCarlos")).await.unwrap();
    db.update_task(t2.id, &TaskChanges {
        assigned_mechanic: Some(Some("TurboCarlos".to_string())),
        ..Default::default()
    })
    .await
    .unwrap();

    let recent = db.mechanic_recent_tasks("TurboCarlos", 10).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].title, "Oil change");
    assert_eq!(recent[0].brand.as_deref(), Some("Toyota"));
}

#[tokio::test]
async fn test_mechanic_stats_aggregates() {
    let db = setup_db().await;
    let car = db.create_car(&corolla()).await.unwrap();
    let t1 = db.create_task(&task_for(car.id, "A", 4)).await.unwrap();
    let t2 = db.create_task(&task_for(car.id, "B", 1)).await.unwrap();
    db.update_task(t1.id, &complete_as("PhonKing")).await.unwrap();
    db.update_task(t2.id, &complete_as("Chicanto")).await.unwrap();

    let (stats, top) = db.mechanic_stats().await.unwrap();
    assert_eq!(stats.total_mechanics, MECHANIC_ROSTER.len() as i64);
    assert_eq!(stats.total_points_awarded, 5);
    assert_eq!(stats.total_tasks_completed, 2);
    assert_eq!(stats.highest_score, 4);

    let top = top.unwrap();
    assert_eq!(top.name, "PhonKing");
    assert_eq!(top.total_points, 4);
}

#[tokio::test]
async fn test_aggregate_stats_counts() {
    let db = setup_db().await;
    let car = db.create_car(&corolla()).await.unwrap();
    let t1 = db.create_task(&task_for(car.id, "A", 1)).await.unwrap();
    db.create_task(&task_for(car.id, "B", 1)).await.unwrap();
    let t3 = db.create_task(&task_for(car.id, "C", 1)).await.unwrap();
    db.update_task(t1.id, &complete_as("Chicanto")).await.unwrap();
    db.update_task(t3.id, &set_status("in_progress")).await.unwrap();

    let stats = db.aggregate_stats().await.unwrap();
    assert_eq!(stats.total_cars, 1);
    assert_eq!(stats.total_tasks, 3);
    assert_eq!(stats.completed_tasks, 1);
    assert_eq!(stats.pending_tasks, 1);
    assert_eq!(stats.in_progress_tasks, 1);
}

#[tokio::test]
async fn test_update_missing_task_reports_none() {
    let db = setup_db().await;
    let result = db.update_task(777, &set_status("completed")).await.unwrap();
    assert!(result.is_none());
}
