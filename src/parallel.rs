use std::thread;
use std::sync::{ Mutex, PoisonError };

use log::{ error, info };
use thiserror::Error;

use crate::consts::PROGRESS_STEP;

/// Errors raised while rendering.
#[derive(Debug, Error, Copy, Clone, PartialEq)]
pub enum RenderError {
    #[error("{0} render worker(s) panicked")]
    WorkerPanicked(usize),
}

/// The shared source of work for render workers.
///
/// Hands out every pixel of an `nx × ny` image exactly once, row by row.
/// Claiming a pixel is the only operation that needs exclusion.
#[derive(Debug)]
pub struct PixelCursor {
    nx: usize,
    ny: usize,
    next: Mutex<usize>,
}

impl PixelCursor {
    pub fn new(nx: usize, ny: usize) -> PixelCursor {
        PixelCursor { nx, ny, next: Mutex::new(0) }
    }

    /// Claims the next pixel as `(col, row)`, or `None` once all are taken.
    pub fn claim(&self) -> Option<(usize, usize)> {
        // The guarded value is a plain counter, valid even if a holder
        // panicked.
        let mut next = self.next.lock().unwrap_or_else(PoisonError::into_inner);
        if *next >= self.nx * self.ny {
            return None;
        }

        let index = *next;
        *next += 1;

        Some((index % self.nx, index / self.nx))
    }
}

/// Counts finished pixels and logs every `PROGRESS_STEP` percent.
#[derive(Debug)]
pub struct Progress {
    total: usize,
    state: Mutex<ProgressState>,
}

#[derive(Debug, Default)]
struct ProgressState {
    done: usize,
    reported: usize,
}

impl Progress {
    pub fn new(total: usize) -> Progress {
        Progress { total, state: Mutex::new(Default::default()) }
    }

    /// Records one finished pixel.
    ///
    /// Returns the percentage just reported, if this pixel crossed a new
    /// milestone.
    pub fn pixel_done(&self) -> Option<usize> {
        let mut state = self.state.lock()
            .unwrap_or_else(PoisonError::into_inner);
        state.done += 1;

        let percent = state.done * 100 / self.total.max(1);
        let milestone = percent - percent % PROGRESS_STEP;
        if milestone <= state.reported {
            return None;
        }

        state.reported = milestone;
        info!("{}% rendered ({}/{} pixels)", milestone, state.done, self.total);
        Some(milestone)
    }

    pub fn done(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).done
    }
}

/// Calls `render` once for every pixel of an `nx × ny` image.
///
/// With `threads == 0` the pixels are rendered on the calling thread, in
/// row order. Otherwise `threads` workers claim pixels from a shared
/// `PixelCursor` until it runs dry. Either way this returns only after every
/// pixel is done and every worker has joined.
pub fn render_pixels<F>(nx: usize, ny: usize, threads: usize, render: F)
    -> Result<(), RenderError>
    where F: Fn(usize, usize) + Sync {
    let cursor = PixelCursor::new(nx, ny);
    let progress = Progress::new(nx * ny);

    if threads == 0 {
        while let Some((col, row)) = cursor.claim() {
            render(col, row);
            progress.pixel_done();
        }

        return Ok(());
    }

    let panicked = thread::scope(|s| {
        let workers: Vec<_> = (0..threads)
            .map(|_| s.spawn(|| {
                while let Some((col, row)) = cursor.claim() {
                    render(col, row);
                    progress.pixel_done();
                }
            }))
            .collect();

        workers.into_iter()
            .map(|worker| worker.join())
            .filter(|joined| joined.is_err())
            .count()
    });

    if panicked > 0 {
        error!("{} of {} render workers panicked", panicked, threads);
        return Err(RenderError::WorkerPanicked(panicked));
    }

    Ok(())
}

#[test]
fn cursor_hands_out_every_pixel_once_in_row_order() {
    let cursor = PixelCursor::new(3, 2);
    let mut claimed = Vec::new();
    while let Some(p) = cursor.claim() {
        claimed.push(p);
    }

    assert_eq!(claimed, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
    assert_eq!(cursor.claim(), None);
}

#[test]
fn empty_image_has_no_work() {
    assert_eq!(PixelCursor::new(0, 5).claim(), None);
    assert_eq!(render_pixels(0, 0, 4, |_, _| panic!("no pixels")), Ok(()));
}

#[test]
fn progress_reports_each_milestone_once() {
    let progress = Progress::new(20);
    let reported: Vec<usize> = (0..20)
        .filter_map(|_| progress.pixel_done())
        .collect();

    assert_eq!(reported, vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
    assert_eq!(progress.done(), 20);
}

#[test]
fn workers_render_each_pixel_exactly_once() {
    let (nx, ny) = (17, 9);
    let counts = Mutex::new(vec![0usize; nx * ny]);

    for &threads in [0, 1, 4].iter() {
        for c in counts.lock().unwrap().iter_mut() {
            *c = 0;
        }

        render_pixels(nx, ny, threads, |col, row| {
            counts.lock().unwrap()[row * nx + col] += 1;
        }).unwrap();

        assert!(counts.lock().unwrap().iter().all(|&c| c == 1));
    }
}

#[test]
fn worker_panic_is_reported_after_join() {
    let result = render_pixels(4, 4, 2, |col, row| {
        if col == 2 && row == 3 {
            panic!("shading fault");
        }
    });

    assert_eq!(result, Err(RenderError::WorkerPanicked(1)));
}
