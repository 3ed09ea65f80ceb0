//! Interrupt-to-engine event path
//!
//! Paddle edges are captured by an interrupt handler (producer) and consumed
//! by the one context that owns the [`PaddleEngine`]. The queue is a
//! lock-free single-producer single-consumer ring.

use heapless::spsc::{Consumer, Producer, Queue};
use portable_atomic::{AtomicU32, Ordering};

use crate::engine::PaddleEngine;
use crate::hal::PaddleEvent;
use crate::sink::KeyingSink;

/// Lower bound for the driver poll interval
pub const MIN_POLL_INTERVAL_US: i64 = 50;

/// Bounded paddle event queue. Holds up to `N - 1` events.
pub struct PaddleEventChannel<const N: usize> {
    queue: Queue<PaddleEvent, N>,
    dropped: AtomicU32,
}

impl<const N: usize> PaddleEventChannel<N> {
    pub const fn new() -> Self {
        Self { queue: Queue::new(), dropped: AtomicU32::new(0) }
    }

    /// Split into the interrupt side and the engine side
    pub fn split(&mut self) -> (EventProducer<'_, N>, EventConsumer<'_, N>) {
        let (producer, consumer) = self.queue.split();
        (
            EventProducer { producer, dropped: &self.dropped },
            EventConsumer { consumer },
        )
    }

    /// Events rejected because the queue was full
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<const N: usize> Default for PaddleEventChannel<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Interrupt side of [`PaddleEventChannel`]
pub struct EventProducer<'a, const N: usize> {
    producer: Producer<'a, PaddleEvent, N>,
    dropped: &'a AtomicU32,
}

impl<'a, const N: usize> EventProducer<'a, N> {
    /// Enqueue an event without blocking. A full queue drops the event and
    /// returns `false`.
    pub fn push(&mut self, event: PaddleEvent) -> bool {
        match self.producer.enqueue(event) {
            Ok(()) => true,
            Err(event) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("paddle event dropped, queue full ({} at {})", event.line, event.timestamp_us);
                false
            }
        }
    }

    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Engine side of [`PaddleEventChannel`]
pub struct EventConsumer<'a, const N: usize> {
    consumer: Consumer<'a, PaddleEvent, N>,
}

impl<'a, const N: usize> EventConsumer<'a, N> {
    pub fn pop(&mut self) -> Option<PaddleEvent> {
        self.consumer.dequeue()
    }

    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Single consumer that feeds queued events into the engine and ticks it
pub struct KeyerDriver<'a, S: KeyingSink, const N: usize> {
    engine: PaddleEngine<S>,
    events: EventConsumer<'a, N>,
}

impl<'a, S: KeyingSink, const N: usize> KeyerDriver<'a, S, N> {
    pub fn new(engine: PaddleEngine<S>, events: EventConsumer<'a, N>) -> Self {
        Self { engine, events }
    }

    /// Drain pending events in order, then advance the engine to `now_us`.
    /// Returns the number of events applied.
    pub fn poll(&mut self, now_us: i64) -> usize {
        let mut applied = 0;
        while let Some(event) = self.events.pop() {
            self.engine.on_paddle_event(&event);
            applied += 1;
        }
        self.engine.tick(now_us);
        applied
    }

    /// 5% of the shortest element, but not below [`MIN_POLL_INTERVAL_US`]
    pub fn poll_interval_us(&self) -> i64 {
        let shortest = self.engine.dit_duration_us().min(self.engine.dah_duration_us());
        (shortest * 5 / 100).max(MIN_POLL_INTERVAL_US)
    }

    pub fn engine(&self) -> &PaddleEngine<S> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PaddleEngine<S> {
        &mut self.engine
    }

    pub fn sink(&self) -> &S {
        self.engine.sink()
    }

    pub fn into_parts(self) -> (PaddleEngine<S>, EventConsumer<'a, N>) {
        (self.engine, self.events)
    }
}

/// Async task running the driver on the embassy time base
#[cfg(feature = "embassy-time")]
pub async fn keyer_task<S: KeyingSink, const N: usize>(mut driver: KeyerDriver<'_, S, N>) {
    use embassy_time::{Duration, Instant, Timer};

    let interval = Duration::from_micros(driver.poll_interval_us() as u64);
    info!("keyer task started, poll every {} us", interval.as_micros());

    loop {
        driver.poll(Instant::now().as_micros() as i64);
        Timer::after(interval).await;
    }
}
