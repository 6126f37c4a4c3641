use bindless_hybrid::frames::InFlightFrames;

#[test]
fn should_cycle_through_every_slot() {
    let mut frames = InFlightFrames::new(3);
    let mut seen = Vec::new();
    for _ in 0..7 {
        let slot = frames.try_begin().expect("a slot is free");
        seen.push(slot.index());
        (frames.completion(slot))();
    }
    assert_eq!(seen, [0, 1, 2, 0, 1, 2, 0]);
    assert_eq!(frames.outstanding(), 0);
}

#[test]
fn should_bound_outstanding_frames() {
    let mut frames = InFlightFrames::new(3);
    let mut in_flight = Vec::new();
    while let Some(slot) = frames.try_begin() {
        in_flight.push(slot);
        assert!(frames.outstanding() <= frames.slots());
    }
    assert_eq!(in_flight.len(), 3);
    assert_eq!(frames.outstanding(), 3);
    assert!(frames.try_begin().is_none());

    // completing the oldest frame frees exactly one slot
    let oldest = in_flight.remove(0);
    (frames.completion(oldest))();
    assert_eq!(frames.outstanding(), 2);
    let next = frames.try_begin().expect("a slot was released");
    assert_eq!(next.index(), 0);
    assert!(frames.try_begin().is_none());
}

#[test]
fn should_wait_until_a_slot_completes() {
    let mut frames = InFlightFrames::new(1);
    let first = frames.try_begin().expect("a slot is free");
    let mut pending = Some(frames.completion(first));
    let mut waits = 0;
    let second = frames.begin(|| {
        waits += 1;
        // stands in for the device finishing the first frame
        if let Some(done) = pending.take() {
            done();
        }
    });
    assert_eq!(waits, 1);
    assert_eq!(second.index(), 0);
    assert_eq!(frames.outstanding(), 1);
}

#[test]
fn should_return_abandoned_slots() {
    let mut frames = InFlightFrames::new(2);
    let slot = frames.try_begin().expect("a slot is free");
    frames.abandon(slot);
    assert_eq!(frames.outstanding(), 0);
    assert!(frames.try_begin().is_some());
    assert!(frames.try_begin().is_some());
}
