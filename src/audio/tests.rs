use std::sync::Arc;
use std::time::{Duration, Instant};

use rodio::buffer::SamplesBuffer;

use super::analyser::{Analyser, WINDOW};
use super::biquad::{BiquadState, Coefficients};
use super::fake::{FakeBackend, finish};
use super::graph::{AudioGraph, ChainCoefficients, EqualizerSettings};
use super::tap::{GraphSlot, GraphSource};
use super::*;
use crate::error::PlaybackError;
use crate::library::fixtures::track;

const SR: f64 = 44_100.0;
const FADE: Duration = Duration::from_millis(500);

fn close(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn transport() -> Transport<FakeBackend> {
    let graph = AudioGraph::new(Analyser::handle(), EqualizerSettings::default());
    Transport::new(FakeBackend::default(), graph, 0.8, FADE)
}

// ---- filters -------------------------------------------------------------

#[test]
fn zero_gain_filters_are_transparent() {
    for c in [
        Coefficients::low_shelf(SR, 200.0, 0.0),
        Coefficients::peaking(SR, 1_000.0, 1.0, 0.0),
        Coefficients::high_shelf(SR, 3_000.0, 0.0),
    ] {
        let mut state = BiquadState::default();
        for x in [0.5_f32, -0.25, 1.0, 0.0, 0.75] {
            assert!(close(state.process(&c, x), x, 1e-5));
        }
    }
}

#[test]
fn shelves_reach_their_gain_at_the_band_edges() {
    let boost = 10.0_f32.powf(6.0 / 20.0);
    let low = Coefficients::low_shelf(SR, 200.0, 6.0);
    assert!(close(low.gain_at_dc(), boost, 1e-3));
    assert!(close(low.gain_at_nyquist(), 1.0, 1e-3));

    let high = Coefficients::high_shelf(SR, 3_000.0, -6.0);
    assert!(close(high.gain_at_nyquist(), 1.0 / boost, 1e-3));
    assert!(close(high.gain_at_dc(), 1.0, 1e-3));
}

#[test]
fn peaking_filter_leaves_extremes_alone() {
    let peak = Coefficients::peaking(SR, 1_000.0, 1.0, 9.0);
    assert!(close(peak.gain_at_dc(), 1.0, 1e-3));
    assert!(close(peak.gain_at_nyquist(), 1.0, 1e-3));
}

#[test]
fn preamp_is_a_linear_gain() {
    let chain = ChainCoefficients::design(
        &EqualizerSettings {
            preamp: -6.0,
            ..EqualizerSettings::default()
        },
        SR,
    );
    assert!(close(chain.preamp, 0.501, 1e-3));
}

// ---- graph ---------------------------------------------------------------

#[test]
fn equalizer_before_graph_is_remembered_then_applied_on_build() {
    let mut graph = AudioGraph::new(Analyser::handle(), EqualizerSettings::default());
    let eq = EqualizerSettings {
        bass: 4.0,
        mid: -2.0,
        treble: 1.5,
        preamp: -3.0,
    };
    assert!(!graph.apply_equalizer(eq));
    assert!(!graph.is_built());

    let mut host = FakeBackend::default();
    assert!(graph.ensure_graph(&mut host));
    let nodes = graph.nodes().unwrap();
    assert_eq!(nodes.eq.load(), eq);
}

#[test]
fn ensure_graph_is_idempotent_and_reroutes_safely() {
    let mut graph = AudioGraph::new(Analyser::handle(), EqualizerSettings::default());
    let mut host = FakeBackend::default();

    assert!(graph.ensure_graph(&mut host));
    let first = Arc::clone(graph.nodes().unwrap());
    assert!(!graph.ensure_graph(&mut host));
    assert!(!graph.ensure_graph(&mut host));

    assert_eq!(host.routes, 3);
    assert!(Arc::ptr_eq(&first, graph.nodes().unwrap()));
    assert!(Arc::ptr_eq(&first, host.routed.as_ref().unwrap()));
}

#[test]
fn apply_equalizer_bumps_the_version_seen_by_sources() {
    let mut graph = AudioGraph::new(Analyser::handle(), EqualizerSettings::default());
    graph.ensure_graph(&mut FakeBackend::default());
    let nodes = Arc::clone(graph.nodes().unwrap());
    let before = nodes.eq.version();

    assert!(graph.apply_equalizer(EqualizerSettings {
        treble: 3.0,
        ..EqualizerSettings::default()
    }));
    assert!(nodes.eq.version() > before);
    assert_eq!(nodes.eq.load().treble, 3.0);
}

#[test]
fn graph_source_passes_through_until_routed() {
    let data = vec![0.1_f32, -0.2, 0.3, -0.4];
    let slot = Arc::new(GraphSlot::default());
    let src = GraphSource::new(SamplesBuffer::new(2, 44_100, data.clone()), slot);
    let out: Vec<f32> = src.collect();
    assert_eq!(out, data);
}

#[test]
fn graph_source_applies_preamp_once_routed() {
    let mut graph = AudioGraph::new(
        Analyser::handle(),
        EqualizerSettings {
            preamp: 6.0,
            ..EqualizerSettings::default()
        },
    );
    graph.ensure_graph(&mut FakeBackend::default());
    let slot = Arc::new(GraphSlot::default());
    assert!(slot.install(graph.nodes().unwrap()));
    assert!(!slot.install(graph.nodes().unwrap()));

    let data = vec![0.25_f32; 8];
    let out: Vec<f32> = GraphSource::new(SamplesBuffer::new(2, 44_100, data), slot).collect();
    let gain = 10.0_f32.powf(6.0 / 20.0);
    assert!(out.iter().all(|&s| close(s, 0.25 * gain, 1e-4)));
}

// ---- analyser ------------------------------------------------------------

#[test]
fn analyser_keeps_the_latest_window_in_order() {
    let a = Analyser::default();
    let first: Vec<f32> = (0..WINDOW).map(|i| i as f32).collect();
    a.push(&first);
    a.push(&[-1.0, -2.0]);

    let w = a.waveform();
    assert_eq!(w.len(), WINDOW);
    assert_eq!(w[0], 2.0);
    assert_eq!(w[WINDOW - 2], -1.0);
    assert_eq!(w[WINDOW - 1], -2.0);
}

#[test]
fn analyser_rms_of_constant_signal() {
    let a = Analyser::default();
    assert_eq!(a.rms(), 0.0);
    a.push(&[0.5; 100]);
    assert!(close(a.rms(), 0.5, 1e-6));
}

#[test]
fn analyser_spectrum_peaks_at_the_tone_bin() {
    let a = Analyser::default();
    let bin = 64;
    let tone: Vec<f32> = (0..WINDOW)
        .map(|i| (2.0 * std::f32::consts::PI * bin as f32 * i as f32 / WINDOW as f32).sin())
        .collect();
    a.push(&tone);

    let spectrum = a.spectrum();
    assert_eq!(spectrum.len(), WINDOW / 2);
    let peak = spectrum
        .iter()
        .enumerate()
        .max_by(|x, y| x.1.total_cmp(y.1))
        .map(|(i, _)| i)
        .unwrap();
    assert_eq!(peak, bin);
}

// ---- transport -----------------------------------------------------------

#[test]
fn load_and_play_starts_muted_and_fades_in() {
    let mut t = transport();
    let now = Instant::now();
    t.load_and_play(track("a"), now).unwrap();

    let unit = t.backend().last();
    {
        let p = unit.lock().unwrap();
        assert!(p.playing);
        assert_eq!(p.volume, 0.0);
    }
    assert_eq!(t.state(), TransportState::Playing);

    t.tick(now + FADE / 2);
    assert!(close(unit.lock().unwrap().volume, 0.4, 0.02));

    t.tick(now + FADE + Duration::from_millis(10));
    assert!(close(unit.lock().unwrap().volume, 0.8, 1e-6));
}

#[test]
fn first_start_resumes_output_and_builds_graph_once() {
    let mut t = transport();
    let now = Instant::now();
    assert!(t.backend().is_suspended());

    t.load_and_play(track("a"), now).unwrap();
    t.load_and_play(track("b"), now).unwrap();

    assert!(!t.backend().is_suspended());
    assert_eq!(t.backend().resumes, 1);
    assert!(t.graph().is_built());
    assert_eq!(t.backend().routes, 2);
}

#[test]
fn switching_tracks_fades_out_and_then_disposes_previous_unit() {
    let mut t = transport();
    let now = Instant::now();
    t.load_and_play(track("a"), now).unwrap();
    t.tick(now + FADE);
    let a = t.backend().last();

    let later = now + Duration::from_secs(10);
    t.load_and_play(track("b"), later).unwrap();
    assert!(!a.lock().unwrap().stopped);
    assert_eq!(t.backend().live_units(), 2);

    t.tick(later + FADE / 2);
    let mid = a.lock().unwrap().volume;
    assert!(mid > 0.0 && mid < 0.8);

    t.tick(later + FADE);
    assert!(a.lock().unwrap().stopped);
    assert_eq!(t.backend().live_units(), 1);
    assert_eq!(t.current_track().unwrap().id.as_str(), "b");
}

#[test]
fn load_failure_leaves_transport_idle() {
    let mut t = transport();
    let now = Instant::now();
    let bad = track("bad");
    t.backend_mut().fail_load.insert(bad.source.clone());

    let err = t.load_and_play(bad, now).unwrap_err();
    assert!(matches!(err, PlaybackError::Load { .. }));
    assert_eq!(t.state(), TransportState::Idle);
    assert!(t.current_track().is_none());

    // Still controllable afterwards.
    t.load_and_play(track("ok"), now).unwrap();
    assert_eq!(t.state(), TransportState::Playing);
}

#[test]
fn play_refusal_is_distinct_from_load_failure() {
    let mut t = transport();
    let now = Instant::now();
    let blocked = track("blocked");
    t.backend_mut()
        .fail_play
        .insert(blocked.source.clone());

    let err = t.load_and_play(blocked, now).unwrap_err();
    assert!(matches!(err, PlaybackError::Play { .. }));
    assert_eq!(t.state(), TransportState::Idle);
    assert!(t.backend().last().lock().unwrap().stopped);
}

#[test]
fn seek_clamps_to_track_bounds() {
    let mut t = transport();
    t.load_and_play(track("a"), Instant::now()).unwrap();

    assert_eq!(t.seek(-5.0).unwrap(), Some(0.0));
    assert_eq!(t.seek(999.0).unwrap(), Some(200.0));
    assert_eq!(t.seek(30.0).unwrap(), Some(30.0));
    assert_eq!(t.position(), 30.0);
}

#[test]
fn seek_without_track_is_a_no_op() {
    let mut t = transport();
    assert_eq!(t.seek(10.0).unwrap(), None);
}

#[test]
fn pause_and_resume_toggle_the_unit() {
    let mut t = transport();
    let now = Instant::now();
    t.load_and_play(track("a"), now).unwrap();
    let unit = t.backend().last();

    assert!(t.pause());
    assert!(!t.pause());
    assert_eq!(t.state(), TransportState::Paused);
    assert!(!unit.lock().unwrap().playing);
    assert!(!t.needs_frames());

    assert!(t.resume().unwrap());
    assert!(unit.lock().unwrap().playing);
    assert_eq!(t.state(), TransportState::Playing);
}

#[test]
fn tick_reports_end_once() {
    let mut t = transport();
    let now = Instant::now();
    t.load_and_play(track("a"), now).unwrap();
    finish(&t.backend().last());

    assert_eq!(t.tick(now), Some(TransportEvent::Ended));
    assert_eq!(t.state(), TransportState::Ended);
    assert_eq!(t.tick(now), None);
}

#[test]
fn rewind_and_halt_after_end_reloads_and_parks_at_zero() {
    let mut t = transport();
    let now = Instant::now();
    t.load_and_play(track("c"), now).unwrap();
    finish(&t.backend().last());
    t.tick(now);

    t.rewind_and_halt().unwrap();
    assert_eq!(t.state(), TransportState::Stopped);
    assert_eq!(t.position(), 0.0);
    assert_eq!(t.current_track().unwrap().id.as_str(), "c");
    assert_eq!(t.backend().units.len(), 2);
    let fresh = t.backend().last();
    assert!(!fresh.lock().unwrap().playing);
    assert!(!fresh.lock().unwrap().finished);
}

#[test]
fn restart_after_end_plays_same_track_from_zero() {
    let mut t = transport();
    let now = Instant::now();
    t.load_and_play(track("a"), now).unwrap();
    finish(&t.backend().last());
    t.tick(now);

    t.restart(now).unwrap();
    assert_eq!(t.state(), TransportState::Playing);
    assert_eq!(t.position(), 0.0);
    assert!(t.backend().last().lock().unwrap().playing);
    assert_eq!(t.current_track().unwrap().id.as_str(), "a");
}

#[test]
fn restore_loads_muted_seeks_then_applies_volume() {
    let mut t = transport();
    t.restore(track("x"), 42.5, 0.6, Instant::now()).unwrap();

    let unit = t.backend().last();
    let p = unit.lock().unwrap();
    assert_eq!(p.seeks, vec![Duration::from_secs_f64(42.5)]);
    assert!(!p.playing);
    assert!(close(p.volume, 0.6, 1e-6));
    drop(p);

    assert_eq!(t.state(), TransportState::Paused);
    assert_eq!(t.position(), 42.5);
    assert!(close(t.volume(), 0.6, 1e-6));
}

#[test]
fn restore_failure_is_reported_and_idle() {
    let mut t = transport();
    let x = track("x");
    t.backend_mut().fail_load.insert(x.source.clone());
    assert!(t.restore(x, 10.0, 0.5, Instant::now()).is_err());
    assert_eq!(t.state(), TransportState::Idle);
}

#[test]
fn volume_change_during_fade_retargets_the_ramp() {
    let mut t = transport();
    let now = Instant::now();
    t.load_and_play(track("a"), now).unwrap();
    t.set_volume(0.4);
    t.tick(now + FADE);
    assert!(close(t.backend().last().lock().unwrap().volume, 0.4, 1e-6));

    t.set_volume(3.0);
    assert_eq!(t.volume(), 1.0);
    assert!(close(t.backend().last().lock().unwrap().volume, 1.0, 1e-6));
}

#[test]
fn stop_fades_out_and_goes_idle() {
    let mut t = transport();
    let now = Instant::now();
    t.load_and_play(track("a"), now).unwrap();
    let unit = t.backend().last();

    t.stop(now + FADE);
    assert_eq!(t.state(), TransportState::Idle);
    assert!(t.needs_frames());
    t.tick(now + FADE * 3);
    assert!(unit.lock().unwrap().stopped);
    assert!(!t.needs_frames());
}

#[test]
fn shutdown_without_fade_stops_immediately() {
    let mut t = transport();
    t.load_and_play(track("a"), Instant::now()).unwrap();
    let unit = t.backend().last();
    t.shutdown(Duration::ZERO);
    assert!(unit.lock().unwrap().stopped);
}
