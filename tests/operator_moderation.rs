//! Integration tests for staff moderation commands: mute, stop, setrank and
//! friends, run end to end through the dispatcher.

mod common;

use common::{TestServer, WorldEvent};
use fishd::caps::{CapabilityAuthority, Rank, RoleFlag};
use fishd::error::DispatchError;
use fishd::handlers::core::Dispatched;
use fishd::state::{ChatVerdict, ModerationError, PlayerId};

const GHOST_ID: &str = "abcdefghijklmnopqrstuv==";

async fn server() -> TestServer {
    TestServer::spawn(&[
        ("m1", "Warden", Rank::Mod, &[]),
        ("m2", "Salmon", Rank::Mod, &[]),
        ("m3", "Keeper", Rank::Mod, &["moderate-peers"]),
        ("a1", "Boss", Rank::Admin, &[]),
        ("p1", "Fish", Rank::Member, &[]),
        (GHOST_ID, "Ghost", Rank::Member, &[]),
    ])
    .await
}

#[tokio::test]
async fn mute_is_recorded_and_not_repeatable() {
    let ts = server().await;
    ts.join("m1", "Warden").await;
    ts.join("p1", "Fish").await;

    let (result, out) = ts.run("m1", "/mute Fish").await;
    assert_eq!(result, Ok(Dispatched::Completed));
    assert_eq!(out.successes(), vec!["Muted player \"Fish\".".to_string()]);
    assert!(ts.handle("p1").read().await.is_muted());

    let (result, out) = ts.run("m1", "/mute Fish").await;
    assert_eq!(
        result,
        Err(DispatchError::HandlerFailure(
            "Player \"Fish\" is already muted.".into()
        ))
    );
    assert_eq!(out.failures().len(), 1);

    let (_, out) = ts.run("m1", "/history Fish").await;
    let text = out.plain().join("\n");
    assert!(text.contains("Player history"), "{text}");
    assert!(text.contains("Warden [yellow]muted Fish"), "{text}");
    assert_eq!(ts.handle("p1").read().await.history().len(), 1);
}

#[tokio::test]
async fn muted_chat_only_reaches_staff() {
    let ts = server().await;
    ts.join("m1", "Warden").await;
    ts.join("p1", "Fish").await;
    ts.run("m1", "/mute Fish").await.0.unwrap();

    let verdict = ts.server.player_chat(&PlayerId::new("p1"), "hello").await;
    assert_eq!(verdict, ChatVerdict::Muted);
    assert!(
        ts.world
            .messages_to("m1")
            .contains(&"[pink][Muted][white] Fish[pink]: [white]hello".to_string())
    );

    ts.run("m1", "/unmute Fish").await.0.unwrap();
    let verdict = ts.server.player_chat(&PlayerId::new("p1"), "hello").await;
    assert_eq!(verdict, ChatVerdict::Allowed);
}

#[tokio::test]
async fn unmuting_a_free_player_conflicts() {
    let ts = server().await;
    let (result, _) = ts.run("m1", "/unmute Fish").await;
    assert_eq!(
        result,
        Err(DispatchError::HandlerFailure(
            "Player \"Fish\" is not muted.".into()
        ))
    );
    assert!(ts.handle("p1").read().await.history().is_empty());
}

#[tokio::test]
async fn equal_rank_cannot_be_moderated_without_peer_flag() {
    let ts = server().await;

    let (result, _) = ts.run("m1", "/mute Salmon").await;
    assert_eq!(
        result,
        Err(DispatchError::Unauthorized(
            "You do not have permission to mute this player.".into()
        ))
    );
    assert!(!ts.handle("m2").read().await.is_muted());

    let (result, _) = ts.run("m3", "/mute Salmon").await;
    assert_eq!(result, Ok(Dispatched::Completed));
    assert!(ts.handle("m2").read().await.is_muted());
}

#[tokio::test]
async fn members_cannot_run_mod_commands() {
    let ts = server().await;
    let (result, out) = ts.run("p1", "/mute Warden").await;
    match result {
        Err(DispatchError::Unauthorized(reason)) => assert!(reason.contains("(mod)"), "{reason}"),
        other => panic!("expected unauthorized, got {other:?}"),
    }
    assert_eq!(out.failures().len(), 1);
    assert!(!ts.handle("m1").read().await.is_muted());
}

#[tokio::test]
async fn custom_denial_is_reported_verbatim() {
    let ts = server().await;
    let (result, out) = ts.run("p1", "/murder").await;
    let denial = "[yellow]You're a [scarlet]monster[].".to_string();
    assert_eq!(result, Err(DispatchError::Unauthorized(denial.clone())));
    assert_eq!(out.failures(), vec![denial]);
}

#[tokio::test]
async fn stop_freezes_now_and_on_every_join() {
    let ts = server().await;
    ts.join("p1", "Fish").await;

    let (result, _) = ts.run("m1", "/stop Fish").await;
    assert_eq!(result, Ok(Dispatched::Completed));
    assert!(ts.world.has(&WorldEvent::Freeze("p1".into())));
    assert!(
        ts.world
            .broadcasts()
            .contains(&"Player \"Fish\" has been stopped.".to_string())
    );

    ts.server.player_leave(&PlayerId::new("p1")).await;
    ts.world.clear();
    ts.join("p1", "Fish").await;
    assert!(ts.world.has(&WorldEvent::Freeze("p1".into())));
    assert!(
        ts.world
            .messages_to("p1")
            .contains(&"[scarlet]You are stopped and cannot move.".to_string())
    );

    let (result, out) = ts.run("m1", "/free Fish").await;
    assert_eq!(result, Ok(Dispatched::Completed));
    assert_eq!(out.successes(), vec!["Player \"Fish\" has been freed.".to_string()]);
    assert!(ts.world.has(&WorldEvent::Unfreeze("p1".into())));
}

#[tokio::test]
async fn stop_offline_by_stable_id() {
    let ts = server().await;

    let (result, out) = ts.run("m1", &format!("/stop_offline {GHOST_ID}")).await;
    assert_eq!(result, Ok(Dispatched::Completed));
    assert_eq!(out.successes(), vec!["Player \"Ghost\" was stopped.".to_string()]);
    // Offline, so nothing to freeze yet.
    assert!(!ts.world.has(&WorldEvent::Freeze(GHOST_ID.into())));

    ts.join(GHOST_ID, "Ghost").await;
    assert!(ts.world.has(&WorldEvent::Freeze(GHOST_ID.into())));
}

#[tokio::test]
async fn warn_shows_a_notice_and_is_logged() {
    let ts = server().await;
    let (result, out) = ts.run("m1", "/warn Fish griefing").await;
    assert_eq!(result, Ok(Dispatched::Completed));
    assert_eq!(
        out.successes(),
        vec!["Warned player \"Fish\" for \"griefing\"".to_string()]
    );
    let notices = ts.menu.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].0, PlayerId::new("p1"));
    assert_eq!(notices[0].2, "griefing");
    assert_eq!(ts.handle("p1").read().await.history()[0].action, "warned");
}

#[tokio::test]
async fn kick_requires_the_target_online() {
    let ts = server().await;
    let (result, _) = ts.run("m1", "/kick Fish").await;
    assert_eq!(
        result,
        Err(DispatchError::HandlerFailure(
            "Player \"Fish\" is not online.".into()
        ))
    );

    ts.join("p1", "Fish").await;
    let (result, _) = ts.run("m1", "/kick Fish").await;
    assert_eq!(result, Ok(Dispatched::Completed));
    assert!(ts.world.has(&WorldEvent::Kick(
        "p1".into(),
        "A staff member did not like your actions.".into()
    )));
}

#[tokio::test]
async fn setrank_rules() {
    let ts = server().await;

    let (result, _) = ts.run("m1", "/setrank Fish mod").await;
    assert_eq!(
        result,
        Err(DispatchError::Unauthorized(
            "You do not have permission to promote players to rank \"mod\", because your current rank is \"mod\"".into()
        ))
    );

    let (result, _) = ts.run("m1", "/setrank Fish bogus").await;
    assert_eq!(
        result,
        Err(DispatchError::HandlerFailure("Unknown rank bogus".into()))
    );

    let (result, _) = ts.run("m1", "/setrank Salmon member").await;
    assert_eq!(
        result,
        Err(DispatchError::Unauthorized(
            "You do not have permission to modify the rank of player \"Salmon\"".into()
        ))
    );
    assert_eq!(ts.handle("m2").read().await.rank(), Rank::Mod);

    let (result, out) = ts.run("m1", "/setrank Fish trusted").await;
    assert_eq!(result, Ok(Dispatched::Completed));
    assert_eq!(
        out.successes(),
        vec!["Set rank of player \"Fish\" to trusted".to_string()]
    );
    assert_eq!(ts.handle("p1").read().await.rank(), Rank::Trusted);

    let (result, _) = ts.run("m1", "/setrank Fish trusted").await;
    assert!(matches!(result, Err(DispatchError::HandlerFailure(_))));
}

#[tokio::test]
async fn authority_flags_cannot_be_handed_out_by_non_holders() {
    let ts = server().await;

    let (result, _) = ts.run("m1", "/setflag Fish all-access true").await;
    assert_eq!(
        result,
        Err(DispatchError::Unauthorized(
            "You do not have permission to change role flag \"all-access\", because you do not hold it.".into()
        ))
    );
    assert!(!ts.handle("p1").read().await.has_flag(RoleFlag::AllAccess));
    let (result, _) = ts.run("p1", "/wave 7").await;
    assert!(matches!(result, Err(DispatchError::Unauthorized(_))));

    let (result, _) = ts.run("m1", "/setflag Fish moderate-peers true").await;
    assert!(matches!(result, Err(DispatchError::Unauthorized(_))));

    // Holders may pass on what they have, and plain flags stay open to staff.
    let (result, _) = ts.run("m3", "/setflag Fish moderate-peers true").await;
    assert_eq!(result, Ok(Dispatched::Completed));
    let (result, _) = ts.run("m1", "/setflag Fish member true").await;
    assert_eq!(result, Ok(Dispatched::Completed));

    let record = ts.handle("p1");
    let record = record.read().await;
    assert!(record.has_flag(RoleFlag::ModeratePeers));
    assert!(record.has_flag(RoleFlag::Member));
    assert_eq!(record.history().len(), 2);
}

#[tokio::test]
async fn promotion_after_a_token_was_issued_wins() {
    let ts = server().await;
    let fish = ts.handle("p1");
    let warden = ts.handle("m1").read().await.actor_info();
    let console = ts.server.console().read().await.actor_info();

    let stale = CapabilityAuthority::request_moderate_cap(&warden, &fish, false)
        .await
        .expect("mod outranks member");
    let promote = CapabilityAuthority::request_moderate_cap(&console, &fish, false)
        .await
        .expect("console outranks member");
    ts.server
        .moderation
        .set_rank(&fish, &console, Rank::Admin, promote)
        .await
        .unwrap();

    let result = ts.server.moderation.mute(&fish, &warden, stale).await;
    assert_eq!(result, Err(ModerationError::Unauthorized("Fish".into())));

    let record = fish.read().await;
    assert!(!record.is_muted());
    assert_eq!(record.rank(), Rank::Admin);
    assert_eq!(record.history().len(), 1);
}

#[tokio::test]
async fn old_rank_commands_point_to_setrank() {
    let ts = server().await;
    let (result, _) = ts.run("a1", "/admin Fish").await;
    assert_eq!(
        result,
        Err(DispatchError::HandlerFailure(
            "This command was moved to /setrank.".into()
        ))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_actions_on_one_target_all_apply() {
    let ts = server().await;

    let (mute, setrank, stop) = tokio::join!(
        ts.run("a1", "/mute Fish"),
        ts.run("m1", "/setrank Fish trusted"),
        ts.run("m3", "/stop Fish"),
    );
    assert_eq!(mute.0, Ok(Dispatched::Completed));
    assert_eq!(setrank.0, Ok(Dispatched::Completed));
    assert_eq!(stop.0, Ok(Dispatched::Completed));

    let record = ts.handle("p1");
    let record = record.read().await;
    assert!(record.is_muted());
    assert!(record.is_stopped());
    assert_eq!(record.rank(), Rank::Trusted);
    let history = record.history();
    assert_eq!(history.len(), 3);
    assert!(history.windows(2).all(|w| w[0].time <= w[1].time));
}
