#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::{Path, PathBuf};
use tagtune::audio::NullPlayback;
use tagtune::navigator::Navigator;

fuzz_target!(|data: &[u8]| {
    let (backend, control) = NullPlayback::with_control();
    let mut navigator = Navigator::new(Box::new(backend));

    let len = (data.len() % 24).max(1);
    let playlist: Vec<PathBuf> = (0..len)
        .map(|idx| PathBuf::from(format!("track_{idx}.mp3")))
        .collect();
    let order: Vec<usize> = (0..len).rev().collect();
    navigator.install_playlist(playlist, order);

    for byte in data {
        match byte % 14 {
            0 => navigator.play(),
            1 => navigator.pause(),
            2 => navigator.stop(),
            3 => navigator.next(),
            4 => navigator.previous(),
            5 => navigator.first(),
            6 => navigator.last(),
            7 => {
                let random = navigator.random();
                navigator.set_random(!random);
            }
            8 => {
                let repeat = navigator.repeat();
                navigator.set_repeat(!repeat);
            }
            9 => navigator.jump_to(Path::new("track_0.mp3")),
            10 => navigator.play_preview(Path::new("track_1.mp3")),
            11 => {
                control.finish_track();
                navigator.tick();
            }
            12 => control.mark_missing(Path::new("track_2.mp3")),
            _ => {
                if let Some(song) = navigator.playlist().first().cloned() {
                    navigator.remove_song(&song);
                }
            }
        }

        if let Some(seq) = navigator.sequential_index() {
            assert!(seq < navigator.playlist().len());
        }
        let mut sorted = navigator.random_order().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..navigator.playlist().len()).collect::<Vec<_>>());
    }
});
