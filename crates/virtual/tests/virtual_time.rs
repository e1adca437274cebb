//! Integration tests: virtual-time executor over the reference runtime
//!
//! Exercises the full surface end to end: fast-forward sleeps, fork/join
//! clock reconciliation, racing, cancellation, and uncancelable regions.

use chrono::Duration;
use std::time::Instant;
use tempo_core::{ExecError, Outcome};
use tempo_ports::{Executor, MaskHandle, RaceWinner};
use tempo_runtime::TokioExecutor;
use tempo_virtual::VirtualExecutor;

fn ms(n: i64) -> Duration {
    Duration::milliseconds(n)
}

fn setup() -> (TokioExecutor, VirtualExecutor<TokioExecutor>) {
    let _ = env_logger::try_init();
    let base = TokioExecutor::new();
    (base.clone(), VirtualExecutor::new(base))
}

#[tokio::test]
async fn test_monotonic_reads_are_nondecreasing() {
    let (base, vt) = setup();

    let vt1 = vt.clone();
    let program = vt.flat_map(vt.monotonic(), move |t1| {
        let vt2 = vt1.clone();
        vt1.flat_map(vt1.cede(), move |_| {
            let vt3 = vt2.clone();
            vt2.flat_map(vt2.sleep(ms(1)), move |_| {
                vt3.map(vt3.monotonic(), move |t2| (t1, t2))
            })
        })
    });

    match base.execute(vt.run(program)).await {
        Outcome::Completed((t1, t2)) => {
            assert!(t2 >= t1);
            assert_eq!(t2 - t1, ms(1));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_hours_of_virtual_sleep_cost_no_real_time() {
    let (base, vt) = setup();

    let program = vt.force_r(vt.sleep(Duration::hours(10)), vt.monotonic());

    let started = Instant::now();
    let outcome = base.execute(vt.run(program)).await;
    let real_elapsed = started.elapsed();

    assert_eq!(outcome, Outcome::Completed(Duration::hours(10)));
    assert!(
        real_elapsed < std::time::Duration::from_millis(100),
        "virtual sleep took {:?} of real time",
        real_elapsed
    );
}

#[tokio::test]
async fn test_join_advances_the_parent_clock() {
    let (base, vt) = setup();

    // Child sleeps 100ms of virtual time; the parent advanced 0ms, so after
    // joining it reads exactly the child's elapsed time.
    let child = vt.force_r(vt.sleep(ms(100)), vt.pure(7));
    let vt1 = vt.clone();
    let program = vt.flat_map(vt.start(child), move |fiber| {
        let vt2 = vt1.clone();
        vt1.flat_map(vt1.join(fiber), move |outcome| {
            vt2.map(vt2.monotonic(), move |now| (outcome, now))
        })
    });

    match base.execute(vt.run(program)).await {
        Outcome::Completed((outcome, now)) => {
            assert_eq!(outcome, Outcome::Completed(7));
            assert_eq!(now, ms(100));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_join_never_moves_the_parent_backwards() {
    let (base, vt) = setup();

    // Child forked at 0 and slept 40ms; the parent slept 150ms before the
    // join, so the max-merge leaves the parent at 150ms.
    let child = vt.force_r(vt.sleep(ms(40)), vt.pure(()));
    let vt1 = vt.clone();
    let program = vt.flat_map(vt.start(child), move |fiber| {
        let vt2 = vt1.clone();
        vt1.flat_map(vt1.sleep(ms(150)), move |_| {
            let vt3 = vt2.clone();
            vt2.flat_map(vt2.join(fiber), move |_| vt3.monotonic())
        })
    });

    assert_eq!(
        base.execute(vt.run(program)).await,
        Outcome::Completed(ms(150))
    );
}

#[tokio::test]
async fn test_race_against_never_adopts_the_winner_clock() {
    let (base, vt) = setup();

    let sleeper = vt.force_r(vt.sleep(ms(10)), vt.pure(1));
    let stuck = vt.never::<i32>();

    let vt1 = vt.clone();
    let program = vt.flat_map(vt.race_pair(sleeper, stuck), move |winner| match winner {
        RaceWinner::Left(outcome, loser) => {
            let vt2 = vt1.clone();
            vt1.flat_map(vt1.cancel(loser), move |_| {
                vt2.map(vt2.monotonic(), move |now| (outcome, now))
            })
        }
        RaceWinner::Right(..) => vt1.raise_error(ExecError::raised("never completed first")),
    });

    match base.execute(vt.run(program)).await {
        Outcome::Completed((outcome, now)) => {
            assert_eq!(outcome, Outcome::Completed(1));
            assert_eq!(now, ms(10));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_race_winner_is_real_completion_order() {
    let (base, vt) = setup();

    // Branch A sleeps 1000ms of *virtual* time but finishes its real steps
    // immediately. Branch B sleeps 50ms of *real* time (lifted base sleep)
    // and carries no virtual time. A wins, virtual sleep notwithstanding.
    let virtual_sleeper = vt.force_r(vt.sleep(ms(1000)), vt.pure("virtual"));
    let real_sleeper = vt.lift(base.sleep(ms(50)));

    let vt1 = vt.clone();
    let program = vt.flat_map(
        vt.race_pair(virtual_sleeper, real_sleeper),
        move |winner| match winner {
            RaceWinner::Left(outcome, loser) => {
                let vt2 = vt1.clone();
                vt1.flat_map(vt1.cancel(loser), move |_| {
                    vt2.map(vt2.monotonic(), move |now| (outcome, now))
                })
            }
            RaceWinner::Right(..) => {
                vt1.raise_error(ExecError::raised("real-time branch completed first"))
            }
        },
    );

    match base.execute(vt.run(program)).await {
        Outcome::Completed((outcome, now)) => {
            assert_eq!(outcome, Outcome::Completed("virtual"));
            assert_eq!(now, ms(1000));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_poll_preserves_the_ambient_clock() {
    let (base, vt) = setup();

    let vt1 = vt.clone();
    let program = vt.flat_map(vt.sleep(ms(20)), move |_| {
        let vt2 = vt1.clone();
        let region = vt1.uncancelable(move |poll| poll.unmask(vt2.monotonic()));
        let vt3 = vt1.clone();
        vt1.flat_map(region, move |inside| {
            vt3.map(vt3.monotonic(), move |outside| (inside, outside))
        })
    });

    match base.execute(vt.run(program)).await {
        Outcome::Completed((inside, outside)) => {
            assert_eq!(inside, ms(20));
            assert_eq!(outside, ms(20));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_time_advanced_inside_a_mask_is_visible_outside() {
    let (base, vt) = setup();

    let vt1 = vt.clone();
    let program = vt.flat_map(vt.sleep(ms(20)), move |_| {
        let vt2 = vt1.clone();
        let region = vt1.uncancelable(move |_poll| vt2.sleep(ms(5)));
        let vt3 = vt1.clone();
        vt1.flat_map(region, move |_| vt3.monotonic())
    });

    assert_eq!(
        base.execute(vt.run(program)).await,
        Outcome::Completed(ms(25))
    );
}

#[tokio::test]
async fn test_canceling_a_fiber_runs_its_finalizer() {
    let (base, vt) = setup();

    let (tx, rx) = tokio::sync::oneshot::channel();
    let finalizer = vt.lift(base.delay(move || {
        let _ = tx.send(());
    }));
    let child = vt.on_cancel(vt.never::<()>(), finalizer);

    let vt1 = vt.clone();
    let program = vt.flat_map(vt.start(child), move |fiber| vt1.cancel(fiber));

    assert_eq!(base.execute(vt.run(program)).await, Outcome::Completed(()));
    rx.await.expect("finalizer did not run");
}

#[tokio::test]
async fn test_join_passes_the_child_error_through() {
    let (base, vt) = setup();

    let child = vt.raise_error::<i32>(ExecError::raised("child failed"));
    let vt1 = vt.clone();
    let program = vt.flat_map(vt.start(child), move |fiber| vt1.join(fiber));

    assert_eq!(
        base.execute(vt.run(program)).await,
        Outcome::Completed(Outcome::Errored(ExecError::raised("child failed")))
    );
}

#[tokio::test]
async fn test_lift_round_trip_matches_direct_execution() {
    let (base, vt) = setup();

    let direct = base.execute(base.lift(async { "payload" })).await;
    let through_layer = base
        .execute(vt.run(vt.lift(base.lift(async { "payload" }))))
        .await;

    assert_eq!(through_layer, direct);
}

#[tokio::test]
async fn test_canceled_propagates_through_run() {
    let (base, vt) = setup();

    let program = vt.force_r(vt.canceled(), vt.pure(1));
    assert_eq!(base.execute(vt.run(program)).await, Outcome::Canceled);
}
