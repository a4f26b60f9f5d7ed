//! Leak checks for handle lifecycles
//!
//! A counting global allocator tracks net bytes and allocation calls per
//! thread. After a warm-up cycle (which pays for one-time state such as the
//! handle registry table and cached configuration), repeated
//! create/use/destroy cycles must leave the net count where it started.
//! aubio's own state is allocated by its C code and is not counted here.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::ptr;

use aubio_wrapper::analysis::signals::click_track;
use aubio_wrapper::ffi::buffer::*;
use aubio_wrapper::ffi::convenience::*;
use aubio_wrapper::ffi::onset::{wrapper_aubio_onset_do, wrapper_del_aubio_onset, wrapper_new_aubio_onset};
use aubio_wrapper::ffi::tempo::wrapper_del_aubio_tempo;

struct Counting;

thread_local! {
    static NET_BYTES: Cell<isize> = const { Cell::new(0) };
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

fn track(delta: isize) {
    let _ = NET_BYTES.try_with(|net| net.set(net.get() + delta));
}

fn count_allocation() {
    let _ = ALLOCATIONS.try_with(|count| count.set(count.get() + 1));
}

fn net_bytes() -> isize {
    NET_BYTES.with(Cell::get)
}

fn allocations() -> usize {
    ALLOCATIONS.with(Cell::get)
}

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        count_allocation();
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            track(layout.size() as isize);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        count_allocation();
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            track(layout.size() as isize);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        track(-(layout.size() as isize));
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        count_allocation();
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            track(new_size as isize - layout.size() as isize);
        }
        new_ptr
    }
}

#[global_allocator]
static ALLOCATOR: Counting = Counting;

const RATE: u32 = 44100;
const HOP: usize = 512;

fn buffer_cycle() {
    let handle = wrapper_new_fvec(1024);
    assert!(!handle.is_null());
    unsafe {
        wrapper_fvec_set_sample(handle, 0.5, 10);
        assert_eq!(wrapper_fvec_get_sample(handle, 10), 0.5);
        wrapper_fvec_zeros(handle);
        wrapper_del_fvec(handle);
    }
}

fn analysis_cycle(signal: &[f32]) {
    unsafe {
        let tempo = wrapper_create_tempo_tracker(RATE);
        let onset = wrapper_create_onset_detector(c"hfc".as_ptr(), RATE);
        let mut bpm = 0.0_f32;
        for block in signal.chunks_exact(HOP) {
            wrapper_process_tempo(tempo, block.as_ptr(), HOP as u32, &mut bpm);
            wrapper_process_onset(onset, block.as_ptr(), HOP as u32);
        }
        wrapper_del_aubio_tempo(tempo);
        wrapper_del_aubio_onset(onset);

        let detector = wrapper_new_aubio_onset(c"specflux".as_ptr(), 1024, HOP as u32, RATE);
        let input = wrapper_new_fvec(HOP as u32);
        let output = wrapper_new_fvec(1);
        wrapper_aubio_onset_do(detector, input, output);
        wrapper_del_fvec(input);
        wrapper_del_fvec(output);
        wrapper_del_aubio_onset(detector);
    }
}

/// Convenience calls that must return before touching anything
fn rejected_convenience_calls(signal: &[f32]) {
    let mut bpm = 0.0_f32;
    unsafe {
        let tempo = wrapper_create_tempo_tracker(RATE);
        let onset = wrapper_create_onset_detector(ptr::null(), RATE);

        let before = allocations();
        assert_eq!(wrapper_process_tempo(tempo, ptr::null(), HOP as u32, &mut bpm), 0);
        assert_eq!(wrapper_process_tempo(tempo, signal.as_ptr(), 0, &mut bpm), 0);
        assert_eq!(wrapper_process_onset(onset, ptr::null(), HOP as u32), 0);
        assert_eq!(wrapper_process_onset(onset, signal.as_ptr(), 0), 0);
        assert_eq!(
            wrapper_process_tempo(ptr::null_mut(), signal.as_ptr(), HOP as u32, &mut bpm),
            0
        );
        assert_eq!(wrapper_process_onset(ptr::null_mut(), signal.as_ptr(), HOP as u32), 0);
        assert_eq!(allocations(), before, "rejected calls allocated");

        wrapper_del_aubio_tempo(tempo);
        wrapper_del_aubio_onset(onset);
    }
}

// One test so every registry table resize happens on the measuring thread
#[test]
fn test_handle_lifecycles_do_not_leak() {
    let signal = click_track(RATE, 120.0, 0.1);
    buffer_cycle();
    analysis_cycle(&signal);
    rejected_convenience_calls(&signal);

    let baseline = net_bytes();
    for _ in 0..10_000 {
        buffer_cycle();
    }
    assert_eq!(net_bytes(), baseline, "buffer lifecycle leaked");

    for _ in 0..1_000 {
        analysis_cycle(&signal);
    }
    assert_eq!(net_bytes(), baseline, "analysis lifecycle leaked");

    for _ in 0..100 {
        rejected_convenience_calls(&signal);
    }
    assert_eq!(net_bytes(), baseline, "rejected calls leaked");
}
