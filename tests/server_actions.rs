//! Integration tests for server-wide commands: restart, save, clean, labels,
//! IP bans, staff chat and camera watching.

mod common;

use chrono::Utc;
use common::{TestServer, WorldEvent, test_config};
use fishd::caps::{Rank, RoleFlag};
use fishd::db::{LAST_RESTART_KEY, MemoryStore};
use fishd::error::{DispatchError, SAVE_FAILED_TEXT};
use fishd::game::{Position, World};
use fishd::handlers::core::Dispatched;
use fishd::handlers::default_registry;
use fishd::state::{ChoiceOutcome, PlayerId};
use std::sync::atomic::Ordering;
use std::time::Duration;

const SEEDS: &[common::Seed<'static>] = &[
    ("m1", "Warden", Rank::Mod, &[]),
    ("a1", "Boss", Rank::Admin, &[]),
    ("p1", "Fish", Rank::Member, &[]),
];

fn is_failure_starting_with(result: &Result<Dispatched, DispatchError>, prefix: &str) -> bool {
    matches!(result, Err(DispatchError::HandlerFailure(m)) if m.starts_with(prefix))
}

#[tokio::test(start_paused = true)]
async fn restart_counts_down_saves_and_exits() {
    let ts = TestServer::spawn(SEEDS).await;
    ts.join("p1", "Fish").await;

    let (result, _) = ts.run("a1", "/restart").await;
    assert_eq!(result, Ok(Dispatched::Completed));
    assert!(ts.server.tasks.restart_pending());
    assert!(ts.store.setting(LAST_RESTART_KEY).is_some());

    tokio::time::sleep(Duration::from_secs(7)).await;

    assert_eq!(
        ts.world.broadcasts(),
        vec![
            "[green]Game saved. [scarlet]Server restarting in:",
            "[scarlet]5",
            "[scarlet]4",
            "[scarlet]3",
            "[scarlet]2",
            "[scarlet]1",
            "[scarlet]0",
        ]
    );
    let events = ts.world.events();
    let kick = events
        .iter()
        .position(|e| *e == WorldEvent::KickAll("[scarlet]The server is restarting.".into()))
        .expect("kicked everyone");
    let save = events
        .iter()
        .position(|e| *e == WorldEvent::SaveWorld("1.msav".into()))
        .expect("saved");
    let exit = events
        .iter()
        .position(|e| *e == WorldEvent::Exit)
        .expect("exited");
    assert!(kick < save && save < exit);
    assert!(!ts.handle("p1").read().await.is_online());

    let (result, _) = ts.run("a1", "/restart").await;
    assert!(
        is_failure_starting_with(&result, "You need to wait at least 10m between restarts."),
        "{result:?}"
    );
}

#[tokio::test]
async fn restart_cooldown_survives_a_restart() {
    let store = MemoryStore::new().with_setting(LAST_RESTART_KEY, Utc::now().timestamp_millis());
    let ts = TestServer::build(test_config(), default_registry().unwrap(), store, SEEDS).await;

    let (result, _) = ts.console("/restart").await;
    assert!(
        is_failure_starting_with(&result, "You need to wait at least"),
        "{result:?}"
    );
    assert!(!ts.server.tasks.restart_pending());
}

#[tokio::test]
async fn restart_needs_admin() {
    let ts = TestServer::spawn(SEEDS).await;
    let (result, _) = ts.run("m1", "/restart").await;
    assert!(matches!(result, Err(DispatchError::Unauthorized(_))));
    assert!(!ts.server.tasks.restart_pending());
}

#[tokio::test]
async fn clean_shares_one_cooldown() {
    let ts = TestServer::spawn(SEEDS).await;

    let (result, out) = ts.run("p1", "/clean").await;
    assert_eq!(result, Ok(Dispatched::Completed));
    assert_eq!(
        out.successes(),
        vec!["\u{2714} Cleared the map of boulders.".to_string()]
    );

    let (result, _) = ts.run("m1", "/clean").await;
    assert!(
        is_failure_starting_with(
            &result,
            "This command was run recently and is on cooldown. Try again in"
        ),
        "{result:?}"
    );
}

#[tokio::test]
async fn save_reports_failures_without_details() {
    let ts = TestServer::spawn(SEEDS).await;

    let (result, out) = ts.run("m1", "/save").await;
    assert_eq!(result, Ok(Dispatched::Completed));
    assert_eq!(out.successes(), vec!["Game saved.".to_string()]);
    assert!(ts.world.has(&WorldEvent::SaveWorld("1.msav".into())));
    assert_eq!(ts.store.saved_players().len(), 3);

    ts.world.fail_saves.store(true, Ordering::SeqCst);
    let (result, out) = ts.run("m1", "/save").await;
    assert_eq!(result, Err(DispatchError::HandlerFailure(SAVE_FAILED_TEXT.into())));
    assert_eq!(out.failures(), vec![SAVE_FAILED_TEXT.to_string()]);
}

#[tokio::test]
async fn wave_must_be_a_positive_integer() {
    let ts = TestServer::spawn(SEEDS).await;
    for bad in ["/wave 0", "/wave 2.5", "/wave -3"] {
        let (result, _) = ts.run("a1", bad).await;
        assert_eq!(
            result,
            Err(DispatchError::HandlerFailure(
                "Wave must be a positive integer.".into()
            )),
            "{bad}"
        );
    }
    let (_, out) = ts.run("a1", "/wave 12").await;
    assert_eq!(out.successes(), vec!["Set wave to 12".to_string()]);
    assert!(ts.world.has(&WorldEvent::SetWave(12)));
}

#[tokio::test(start_paused = true)]
async fn label_validates_and_counts_down() {
    let ts = TestServer::spawn(SEEDS).await;

    let (result, _) = ts.run("a1", "/label 0 hi").await;
    assert_eq!(
        result,
        Err(DispatchError::HandlerFailure(
            "Time must be a positive number less than 3600.".into()
        ))
    );
    let (result, _) = ts.run("a1", "/label 3 hi").await;
    assert_eq!(
        result,
        Err(DispatchError::HandlerFailure(
            "You need a unit to place a label.".into()
        ))
    );

    ts.world.give_unit("a1", Position::new(4.0, 8.0));
    let (result, out) = ts.run("a1", "/label 3 hi").await;
    assert_eq!(result, Ok(Dispatched::Completed));
    assert_eq!(
        out.successes(),
        vec!["Placed label \"hi\" for 3 seconds.".to_string()]
    );

    tokio::time::sleep(Duration::from_secs(5)).await;
    let labels: Vec<WorldEvent> = ts
        .world
        .events()
        .into_iter()
        .filter(|e| matches!(e, WorldEvent::Label(_)))
        .collect();
    assert_eq!(
        labels,
        vec![
            WorldEvent::Label("Boss\n\n[white]hi\n\n[acid]0:03".into()),
            WorldEvent::Label("Boss\n\n[white]hi\n\n[acid]0:02".into()),
            WorldEvent::Label("Boss\n\n[white]hi\n\n[acid]0:01".into()),
        ]
    );
}

#[tokio::test]
async fn ipban_by_address() {
    let ts = TestServer::spawn(SEEDS).await;
    let (result, _) = ts.run("a1", "/ipban 1.2.3.4").await;
    assert_eq!(result, Ok(Dispatched::Completed));
    assert!(ts.world.has(&WorldEvent::BanIp("1.2.3.4".into())));

    let (result, _) = ts.run("a1", "/ipban fish").await;
    assert_eq!(
        result,
        Err(DispatchError::HandlerFailure(
            "\"fish\" is not an IP address.".into()
        ))
    );
}

#[tokio::test]
async fn ipban_by_address_respects_rank_and_is_recorded() {
    let ts = TestServer::spawn(&[
        ("a1", "Boss", Rank::Admin, &[]),
        ("mgr", "Chief", Rank::Manager, &[]),
        ("p1", "Fish", Rank::Member, &[]),
    ])
    .await;
    ts.join("mgr", "Chief").await;
    ts.join("p1", "Fish").await;

    // join() hands out 10.0.0.<id length>.
    let (result, _) = ts.run("a1", "/ipban 10.0.0.3").await;
    assert_eq!(
        result,
        Err(DispatchError::Unauthorized(
            "You do not have permission to IP ban 10.0.0.3, because it belongs to player \"Chief\".".into()
        ))
    );
    assert!(!ts.world.has(&WorldEvent::BanIp("10.0.0.3".into())));
    assert!(ts.handle("mgr").read().await.history().is_empty());

    let (result, out) = ts.run("a1", "/ipban 10.0.0.2").await;
    assert_eq!(result, Ok(Dispatched::Completed));
    assert_eq!(out.successes(), vec!["IP-banned 10.0.0.2.".to_string()]);
    assert!(ts.world.has(&WorldEvent::BanIp("10.0.0.2".into())));
    assert!(ts.world.has(&WorldEvent::Kick(
        "p1".into(),
        "You have been banned.".into()
    )));
    let fish = ts.handle("p1");
    let fish = fish.read().await;
    assert_eq!(fish.history().len(), 1);
    assert_eq!(fish.history()[0].action, "ip-banned");
    assert_eq!(fish.history()[0].actor, "Boss");
}

#[tokio::test]
async fn ipban_menu_bans_kicks_and_records() {
    let ts = TestServer::spawn(SEEDS).await;

    let (result, _) = ts.run("a1", "/ipban").await;
    assert_eq!(
        result,
        Err(DispatchError::HandlerFailure(
            "There are no players you can IP ban.".into()
        ))
    );

    ts.join("p1", "Fish").await;
    let (result, out) = ts.run("a1", "/ipban").await;
    let Ok(Dispatched::Pending(id)) = result else {
        panic!("expected a menu, got {result:?}");
    };
    let request = ts.menu.last_choice().expect("menu shown");
    assert_eq!(request.title, "IP BAN");
    assert_eq!(request.options, vec!["Fish".to_string()]);

    let outcome = ts
        .server
        .resolve_choice(&id, &PlayerId::new("a1"), Some(0))
        .await
        .unwrap();
    assert_eq!(outcome, ChoiceOutcome::Resumed(Ok(Dispatched::Completed)));
    assert_eq!(out.successes(), vec!["IP-banned player Fish.".to_string()]);
    assert!(ts.world.has(&WorldEvent::BanIp("10.0.0.2".into())));
    assert!(ts.world.has(&WorldEvent::Kick(
        "p1".into(),
        "You have been banned.".into()
    )));
    assert_eq!(ts.handle("p1").read().await.history()[0].action, "ip-banned");
}

#[tokio::test]
async fn membership_changes_are_saved() {
    let ts = TestServer::spawn(SEEDS).await;
    let (result, out) = ts.run("a1", "/member true Fish").await;
    assert_eq!(result, Ok(Dispatched::Completed));
    assert_eq!(
        out.successes(),
        vec!["Set membership status of player \"Fish\" to true.".to_string()]
    );
    let saved = ts.store.saved_players();
    let fish = saved
        .iter()
        .find(|r| r.id().as_str() == "p1")
        .expect("saved record");
    assert!(fish.has_flag(RoleFlag::Member));
}

#[tokio::test]
async fn staff_and_muted_chat_channels() {
    let ts = TestServer::spawn(SEEDS).await;
    ts.join("m1", "Warden").await;
    ts.join("p1", "Fish").await;

    let (result, out) = ts.run("p1", "/s help me").await;
    assert_eq!(result, Ok(Dispatched::Completed));
    assert!(out.all().is_empty());
    assert_eq!(
        ts.world.messages_to("m1"),
        vec!["[gray]<[cyan]staff[gray]>[white]Fish[green]: [cyan]help me".to_string()]
    );
    assert!(ts.world.messages_to("p1").is_empty());

    ts.run("m1", "/mute Fish").await.0.unwrap();
    ts.run("m1", "/m behave").await.0.unwrap();
    assert!(
        ts.world
            .messages_to("p1")
            .contains(&"[pink][Muted][white] Warden[pink]: [white]behave".to_string())
    );
}

#[tokio::test]
async fn murder_reports_the_count() {
    let ts = TestServer::spawn(SEEDS).await;
    ts.world.ohnos.store(3, Ordering::SeqCst);
    let (_, out) = ts.run("m1", "/murder").await;
    assert_eq!(
        out.plain(),
        vec!["[orange]You massacred [cyan]3[] helpless ohno crawlers.".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn watch_toggles_and_stops_when_the_target_leaves() {
    let ts = TestServer::spawn(SEEDS).await;
    ts.world.give_unit("m1", Position::new(0.0, 0.0));
    ts.world.give_unit("p1", Position::new(10.0, 10.0));
    let watcher = PlayerId::new("m1");

    let (_, out) = ts.run("m1", "/watch Fish").await;
    assert_eq!(out.successes(), vec!["Watching player \"Fish\".".to_string()]);
    assert!(ts.server.tasks.is_watching(&watcher));

    let (_, out) = ts.run("m1", "/watch").await;
    assert_eq!(
        out.successes(),
        vec!["No longer watching a player.".to_string()]
    );
    assert!(!ts.server.tasks.is_watching(&watcher));

    let (result, _) = ts.run("m1", "/watch").await;
    assert_eq!(result, Err(DispatchError::Usage("/watch [player]".into())));

    ts.run("m1", "/watch Fish").await.0.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(ts.world.count(|e| *e == WorldEvent::SetCamera("m1".into())) > 0);

    ts.world.kill_unit(&PlayerId::new("p1"));
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(!ts.server.tasks.is_watching(&watcher));
}
