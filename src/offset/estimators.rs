//! Per-client online estimators: EWMA, a scalar Kalman filter, and a PID
//! controller, plus the bounded ring buffer of recent samples they share
//! (spec §3, "Estimator state"; spec §4.10).

use std::collections::VecDeque;

use crate::constants::{
    ANOMALY_STDDEV_THRESHOLD, BIAS_CAPTURE_PACKET, EWMA_ALPHA, KALMAN_INITIAL_P,
    KALMAN_MEASUREMENT_NOISE_R, KALMAN_PROCESS_NOISE_Q, PID_KD, PID_KI, PID_KP,
    SAMPLE_RING_CAPACITY,
};

/// A fixed-capacity FIFO of recent clock-offset samples, in microseconds.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    samples: VecDeque<i64>,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: i64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<i64>() as f64 / self.samples.len() as f64
    }

    pub fn iter(&self) -> impl Iterator<Item = &i64> {
        self.samples.iter()
    }

    pub fn stddev(&self) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .samples
            .iter()
            .map(|&s| {
                let d = s as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / self.samples.len() as f64;
        variance.sqrt()
    }
}

/// Exponentially-weighted moving average.
#[derive(Debug, Clone, Copy)]
pub struct EwmaEstimator {
    alpha: f64,
    prediction: Option<f64>,
}

impl EwmaEstimator {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            prediction: None,
        }
    }

    pub fn update(&mut self, sample: i64) -> f64 {
        let sample = sample as f64;
        let next = match self.prediction {
            None => sample,
            Some(p) => self.alpha * sample + (1.0 - self.alpha) * p,
        };
        self.prediction = Some(next);
        next
    }

    pub fn prediction(&self) -> Option<f64> {
        self.prediction
    }
}

impl Default for EwmaEstimator {
    fn default() -> Self {
        Self::new(EWMA_ALPHA)
    }
}

/// One-dimensional Kalman filter over scalar clock offset.
#[derive(Debug, Clone, Copy)]
pub struct KalmanEstimator {
    x: Option<f64>,
    p: f64,
    q: f64,
    r: f64,
}

impl KalmanEstimator {
    pub fn new(initial_p: f64, process_noise_q: f64, measurement_noise_r: f64) -> Self {
        Self {
            x: None,
            p: initial_p,
            q: process_noise_q,
            r: measurement_noise_r,
        }
    }

    pub fn update(&mut self, sample: i64) -> f64 {
        let sample = sample as f64;
        let x = match self.x {
            None => {
                self.x = Some(sample);
                sample
            }
            Some(x_prev) => {
                let x_pred = x_prev;
                let p_pred = self.p + self.q;
                let k = p_pred / (p_pred + self.r);
                let x_new = x_pred + k * (sample - x_pred);
                self.p = (1.0 - k) * p_pred;
                self.x = Some(x_new);
                x_new
            }
        };
        x
    }

    pub fn estimate(&self) -> Option<f64> {
        self.x
    }
}

impl Default for KalmanEstimator {
    fn default() -> Self {
        Self::new(
            KALMAN_INITIAL_P,
            KALMAN_PROCESS_NOISE_Q,
            KALMAN_MEASUREMENT_NOISE_R,
        )
    }
}

/// PID controller driven directly by the raw offset sample (spec §4.10).
#[derive(Debug, Clone, Copy)]
pub struct PidEstimator {
    kp: f64,
    ki: f64,
    kd: f64,
    integral: f64,
    prev_error: Option<f64>,
}

impl PidEstimator {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            integral: 0.0,
            prev_error: None,
        }
    }

    pub fn update(&mut self, sample: i64) -> f64 {
        let sample = sample as f64;
        self.integral += sample;
        let derivative = match self.prev_error {
            None => 0.0,
            Some(prev) => sample - prev,
        };
        self.prev_error = Some(sample);
        self.kp * sample + self.ki * self.integral + self.kd * derivative
    }
}

impl Default for PidEstimator {
    fn default() -> Self {
        Self::new(PID_KP, PID_KI, PID_KD)
    }
}

/// The output of feeding one sample through all three estimators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimateSet {
    pub raw: i64,
    pub ewma: f64,
    pub kalman: f64,
    pub pid: f64,
    /// Set when `|raw|` exceeds `threshold * stddev` of prior samples.
    pub anomalous: bool,
}

/// Bundles the ring buffer and all three estimators for one client.
#[derive(Debug, Clone)]
pub struct EstimatorBank {
    ring: RingBuffer,
    ewma: EwmaEstimator,
    kalman: KalmanEstimator,
    pid: PidEstimator,
    packet_count: u64,
    /// Raw sample captured at packet #`BIAS_CAPTURE_PACKET`, used by the
    /// reply formatter to report deltas from steady state (spec §4.11).
    bias_us: Option<i64>,
}

impl EstimatorBank {
    pub fn new() -> Self {
        Self {
            ring: RingBuffer::new(SAMPLE_RING_CAPACITY),
            ewma: EwmaEstimator::default(),
            kalman: KalmanEstimator::default(),
            pid: PidEstimator::default(),
            packet_count: 0,
            bias_us: None,
        }
    }

    pub fn packet_count(&self) -> u64 {
        self.packet_count
    }

    pub fn bias_us(&self) -> Option<i64> {
        self.bias_us
    }

    pub fn ring(&self) -> &RingBuffer {
        &self.ring
    }

    /// Feeds one sample through every estimator, flags anomalies against
    /// the buffer's prior state, then records the sample.
    pub fn observe(&mut self, sample: i64) -> EstimateSet {
        let anomalous = if self.ring.len() >= 2 {
            let stddev = self.ring.stddev();
            stddev > 0.0 && (sample as f64).abs() > ANOMALY_STDDEV_THRESHOLD * stddev
        } else {
            false
        };

        let ewma = self.ewma.update(sample);
        let kalman = self.kalman.update(sample);
        let pid = self.pid.update(sample);

        self.ring.push(sample);
        self.packet_count += 1;
        if self.packet_count == BIAS_CAPTURE_PACKET {
            self.bias_us = Some(sample);
        }

        EstimateSet {
            raw: sample,
            ewma,
            kalman,
            pid,
            anomalous,
        }
    }
}

impl Default for EstimatorBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ewma_converges_on_constant_stream() {
        let mut ewma = EwmaEstimator::new(0.2);
        let mut last = 0.0;
        for _ in 0..15 {
            last = ewma.update(1_000_000);
        }
        assert!((last - 1_000_000.0).abs() / 1_000_000.0 < 0.05);
    }

    #[test]
    fn kalman_converges_on_constant_stream() {
        let mut kalman = KalmanEstimator::default();
        let mut last = 0.0;
        for _ in 0..10 {
            last = kalman.update(1_000_000);
        }
        assert!((last - 1_000_000.0).abs() / 1_000_000.0 < 0.05);
    }

    #[test]
    fn kalman_converges_on_noisy_offset_median() {
        // Deterministic pseudo-noise so the test needs no RNG dependency.
        let noise = [
            500_000i64, -500_000, 250_000, -250_000, 100_000, -100_000, 400_000, -400_000,
        ];
        let mut kalman = KalmanEstimator::default();
        let mut estimates = Vec::new();
        for step in 0..200 {
            let sample = 1_000_000 + noise[step % noise.len()];
            estimates.push(kalman.update(sample));
        }
        let after_50 = estimates[49];
        assert!((after_50 - 1_000_000.0).abs() < 100_000.0);
    }

    #[test]
    fn ring_buffer_evicts_oldest() {
        let mut ring = RingBuffer::new(3);
        ring.push(1);
        ring.push(2);
        ring.push(3);
        ring.push(4);
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.mean(), 3.0);
    }

    #[test]
    fn bank_flags_large_outlier() {
        let mut bank = EstimatorBank::new();
        for _ in 0..20 {
            bank.observe(1_000);
        }
        let estimate = bank.observe(1_000_000);
        assert!(estimate.anomalous);
    }
}
