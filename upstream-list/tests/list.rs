use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use upstream_list::mock::{FailingResolver, FixedRng, ScriptedResolver};
use upstream_list::{Ctx, LibraryConfig, LimitsOverride, ParseMode, Rotation, UpstreamList, WatchEvent, WatchEvents};

fn recorder() -> Arc<Mutex<Vec<(String, WatchEvent, u32)>>> {
    Arc::new(Mutex::new(Vec::new()))
}

#[test]
fn addr_next_is_stable_on_a_single_address_upstream() {
    let list = UpstreamList::new(None);
    list.add_upstream("10.0.0.1:80", 80, ParseMode::Default, None).unwrap();
    let sel = list.get(Rotation::Sequential, None).unwrap();
    assert_eq!(sel.addr_next(), sel.addr_cur());
}

#[test]
fn round_robin_prefers_highest_weight_then_falls_back_to_min_checked() {
    let list = UpstreamList::new(None);
    list.add_upstream("10.0.0.1:80:5", 80, ParseMode::Default, None).unwrap();
    list.add_upstream("10.0.0.2:80:1", 80, ParseMode::Default, None).unwrap();

    // With distinct static weights, MasterSlave always prefers the heavier
    // upstream regardless of how many times it's been picked.
    for _ in 0..10 {
        let sel = list.get(Rotation::MasterSlave, None).unwrap();
        assert_eq!(sel.name(), "10.0.0.1");
    }
}

#[test]
fn round_robin_cycles_cur_weight_down_then_refills() {
    let list = UpstreamList::new(None);
    list.add_upstream("10.0.0.1:80:2", 80, ParseMode::Default, None).unwrap();
    list.add_upstream("10.0.0.2:80:1", 80, ParseMode::Default, None).unwrap();

    let mut picks = Vec::new();
    for _ in 0..6 {
        picks.push(list.get(Rotation::RoundRobin, None).unwrap().name());
    }
    // cur_weight wins picks 1-2 (A:2->1->0, B:1 untouched), then both
    // cur_weight hit zero simultaneously on pick 3 and selection falls back
    // to min_checked (lowest checked*(errors+1)) until a refill restores a
    // nonzero cur_weight: A,A,B,B,B,A.
    assert_eq!(picks, vec!["10.0.0.1", "10.0.0.1", "10.0.0.2", "10.0.0.2", "10.0.0.2", "10.0.0.1"]);
}

#[test]
fn hashed_selection_is_deterministic_for_a_fixed_key() {
    let list = UpstreamList::new(None);
    for i in 0..5 {
        list.add_upstream(&format!("10.0.0.{}:80", i), 80, ParseMode::Default, None)
            .unwrap();
    }
    let key = b"user-42";
    let first = list.get(Rotation::Hashed, Some(key)).unwrap().name();
    for _ in 0..20 {
        let again = list.get(Rotation::Hashed, Some(key)).unwrap().name();
        assert_eq!(first, again);
    }
}

#[test]
fn hashed_without_key_falls_back_to_random() {
    let list = UpstreamList::new(None);
    list.add_upstream("10.0.0.1:80", 80, ParseMode::Default, None).unwrap();
    list.add_upstream("10.0.0.2:80", 80, ParseMode::Default, None).unwrap();
    // Should not panic despite no key being supplied for a Hashed rotation.
    assert!(list.get(Rotation::Hashed, None).is_some());
}

#[test]
fn sequential_exhausts_then_resets() {
    let list = UpstreamList::new(None);
    list.add_upstream("10.0.0.1:80", 80, ParseMode::Default, None).unwrap();
    list.add_upstream("10.0.0.2:80", 80, ParseMode::Default, None).unwrap();

    assert_eq!(list.get(Rotation::Sequential, None).unwrap().name(), "10.0.0.1");
    assert_eq!(list.get(Rotation::Sequential, None).unwrap().name(), "10.0.0.2");
    assert!(list.get(Rotation::Sequential, None).is_none());
    assert_eq!(list.get(Rotation::Sequential, None).unwrap().name(), "10.0.0.1");
}

#[tokio::test(start_paused = true)]
async fn failure_past_threshold_ejects_and_fires_offline_with_pre_reset_count() {
    let ctx = Ctx::init();
    let list = UpstreamList::new(Some(&ctx));
    list.set_limits(LimitsOverride {
        max_errors: Some(4),
        error_time: Some(10.0),
        ..Default::default()
    });
    list.add_upstream("10.0.0.1:80", 80, ParseMode::Default, None).unwrap();
    list.add_upstream("10.0.0.2:80", 80, ParseMode::Default, None).unwrap();

    let events = recorder();
    let events_cb = events.clone();
    list.add_watch_callback::<_, fn(Option<&upstream_list::UserData>)>(
        WatchEvents::ALL,
        move |name, ev, count, _| events_cb.lock().unwrap().push((name.to_string(), ev, count)),
        None,
        None,
    );

    let sel = list.get_forced(Rotation::Sequential, None).unwrap();
    assert_eq!(sel.name(), "10.0.0.1");

    // Spaced so the error rate (errors / time since the first failure) sits
    // exactly at the 0.4/s threshold through the fourth failure and only
    // tips over it on the fifth.
    sel.fail(false);
    tokio::time::advance(std::time::Duration::from_secs(5)).await;
    sel.fail(false);
    tokio::time::advance(std::time::Duration::from_millis(2500)).await;
    sel.fail(false);
    tokio::time::advance(std::time::Duration::from_millis(2500)).await;
    sel.fail(false);
    tokio::time::advance(std::time::Duration::from_secs(2)).await;
    sel.fail(false);

    let recorded = events.lock().unwrap().clone();
    let offline: Vec<_> = recorded.iter().filter(|(_, ev, _)| *ev == WatchEvent::Offline).collect();
    assert_eq!(offline.len(), 1);
    assert_eq!(offline[0].2, 5, "OFFLINE must carry the error count observed before the reset to zero");
    assert_eq!(list.alive_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn ejected_upstream_revives_after_the_configured_delay() {
    let ctx = Ctx::init();
    let rng = Arc::new(FixedRng::constant(0.0));
    let list = UpstreamList::with_rng(Some(&ctx), rng);
    list.set_limits(LimitsOverride {
        max_errors: Some(1),
        error_time: Some(10.0),
        revive_time: Some(30.0),
        revive_jitter: Some(0.0),
        ..Default::default()
    });
    list.add_upstream("10.0.0.1:80", 80, ParseMode::Default, None).unwrap();
    list.add_upstream("10.0.0.2:80", 80, ParseMode::Default, None).unwrap();

    let sel = list.get_forced(Rotation::Sequential, None).unwrap();
    sel.fail(false);
    sel.fail(false);
    assert_eq!(list.alive_count(), 1);

    tokio::time::advance(std::time::Duration::from_secs(31)).await;
    tokio::task::yield_now().await;
    assert_eq!(list.alive_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn single_upstream_degenerate_path_reresolves_instead_of_ejecting() {
    let ctx = Ctx::init();
    let list = UpstreamList::new(Some(&ctx));
    list.set_limits(LimitsOverride {
        max_errors: Some(1),
        error_time: Some(1.0),
        revive_time: Some(5.0),
        ..Default::default()
    });
    list.add_upstream("10.0.0.1:80", 80, ParseMode::Default, None).unwrap();

    let sel = list.get(Rotation::Random, None).unwrap();
    sel.fail(false);
    tokio::time::advance(std::time::Duration::from_secs(6)).await;
    sel.fail(false);

    // A lone upstream is never ejected; it always stays alive.
    assert_eq!(list.alive_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn dns_reconciliation_preserves_error_counts_and_resolves_first_time() {
    let ctx = Ctx::init();
    let list = UpstreamList::new(Some(&ctx));
    list.set_limits(LimitsOverride {
        lazy_resolve_time: Some(60.0),
        ..Default::default()
    });
    list.parse_line("mx.example.com", 25, None);

    let resolver = Arc::new(ScriptedResolver::new());
    resolver.set("mx.example.com", vec![Ipv4Addr::new(192, 0, 2, 1)], vec![]);
    ctx.configure(&LibraryConfig::default(), resolver.clone());

    tokio::time::advance(std::time::Duration::from_millis(1)).await;
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;

    let sel = list.get(Rotation::Random, None).unwrap();
    assert_eq!(sel.addr_cur().to_string(), "192.0.2.1:25");
}

#[tokio::test(start_paused = true)]
async fn hostname_upstream_carries_its_explicit_port_to_the_first_resolution() {
    let ctx = Ctx::init();
    let list = UpstreamList::new(Some(&ctx));
    list.set_limits(LimitsOverride {
        lazy_resolve_time: Some(60.0),
        ..Default::default()
    });
    // Default port is 80; the spec's own `:2525` must win.
    list.add_upstream("mx.example.com:2525", 80, ParseMode::Default, None).unwrap();

    let resolver = Arc::new(ScriptedResolver::new());
    resolver.set("mx.example.com", vec![Ipv4Addr::new(192, 0, 2, 1)], vec![]);
    ctx.configure(&LibraryConfig::default(), resolver.clone());

    tokio::time::advance(std::time::Duration::from_millis(1)).await;
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;

    let sel = list.get(Rotation::Random, None).unwrap();
    assert_eq!(sel.addr_cur().to_string(), "192.0.2.1:2525");
}

#[tokio::test(start_paused = true)]
async fn all_ejected_triggers_mass_restore_on_next_get() {
    let ctx = Ctx::init();
    let list = UpstreamList::new(Some(&ctx));
    list.set_limits(LimitsOverride {
        max_errors: Some(1),
        error_time: Some(10.0),
        ..Default::default()
    });
    list.add_upstream("10.0.0.1:80", 80, ParseMode::Default, None).unwrap();
    list.add_upstream("10.0.0.2:80", 80, ParseMode::Default, None).unwrap();

    for _ in 0..2 {
        let sel = list.get_forced(Rotation::Sequential, None).unwrap();
        sel.fail(false);
        sel.fail(false);
    }
    assert_eq!(list.alive_count(), 0);

    let sel = list.get(Rotation::Random, None);
    assert!(sel.is_some());
    assert_eq!(list.alive_count(), 2);
}

#[test]
fn failure_is_a_no_op_without_a_context() {
    let list = UpstreamList::new(None);
    list.add_upstream("10.0.0.1:80", 80, ParseMode::Default, None).unwrap();
    let sel = list.get(Rotation::Random, None).unwrap();
    for _ in 0..100 {
        sel.fail(false);
    }
    assert_eq!(list.alive_count(), 1);
}

#[test]
fn parse_line_sets_rotation_and_splits_on_any_separator() {
    let list = UpstreamList::new(None);
    let ok = list.parse_line("hash:10.0.0.1:80, 10.0.0.2:80;10.0.0.3:80\t10.0.0.4:80", 80, None);
    assert!(ok);
    assert_eq!(list.count(), 4);
}

#[test]
fn master_slave_promotes_zero_weight_first_upstream_to_one() {
    let list = UpstreamList::new(None);
    list.set_rotation(Rotation::MasterSlave);
    list.add_upstream("10.0.0.1:80", 80, ParseMode::Default, None).unwrap();
    list.add_upstream("10.0.0.2:80", 80, ParseMode::Default, None).unwrap();
    for _ in 0..5 {
        assert_eq!(list.get(Rotation::Undef, None).unwrap().name(), "10.0.0.1");
    }
}

#[test]
fn nameserver_mode_rejects_hostnames() {
    let list = UpstreamList::new(None);
    assert!(list.add_upstream("resolver.example.com", 53, ParseMode::Nameserver, None).is_err());
    assert!(list.add_upstream("1.1.1.1", 53, ParseMode::Nameserver, None).is_ok());
}

#[tokio::test]
async fn failing_resolver_is_absorbed_without_panicking() {
    let ctx = Ctx::init();
    let list = UpstreamList::new(Some(&ctx));
    list.parse_line("broken.example.com", 80, None);
    ctx.configure(&LibraryConfig::default(), Arc::new(FailingResolver));
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
    // No panic, and the upstream simply has no addresses yet.
    assert_eq!(list.count(), 1);
}
