//! Butterworth low-pass filtering
//!
//! IIR filters are realised as cascaded second-order sections (biquads) for
//! numerical stability. Offline signals are filtered forward and backward,
//! which cancels the phase shift of the single pass.

use std::f64::consts::PI;

/// Second-order section (biquad) coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Gain at 0 Hz
    pub fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }
}

/// Single biquad section, Direct Form II Transposed
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    coeffs: BiquadCoeffs,
    z1: f64,
    z2: f64,
}

impl BiquadFilter {
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            z1: 0.0,
            z2: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let c = &self.coeffs;
        let output = c.b0 * input + self.z1;
        self.z1 = c.b1 * input - c.a1 * output + self.z2;
        self.z2 = c.b2 * input - c.a2 * output;
        output
    }

    /// Put the section into the state it would settle in after an infinitely
    /// long constant input. Returns the settled output.
    fn prime(&mut self, input: f64) -> f64 {
        let c = &self.coeffs;
        let output = c.dc_gain() * input;
        self.z1 = output - c.b0 * input;
        self.z2 = c.b2 * input - c.a2 * output;
        output
    }
}

/// Cascaded second-order sections
#[derive(Debug, Clone)]
pub struct SosFilter {
    sections: Vec<BiquadFilter>,
}

impl SosFilter {
    pub fn new(sections: Vec<BiquadCoeffs>) -> Self {
        Self {
            sections: sections.into_iter().map(BiquadFilter::new).collect(),
        }
    }

    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        self.sections
            .iter_mut()
            .fold(input, |sample, section| section.process(sample))
    }

    /// Steady-state initial conditions for a signal starting at `input`
    pub fn prime(&mut self, input: f64) {
        self.sections
            .iter_mut()
            .fold(input, |sample, section| section.prime(sample));
    }

    /// Process an entire signal in-place
    pub fn process_signal(&mut self, signal: &mut [f64]) {
        for sample in signal.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Zero-phase filtering: forward pass, then backward pass over the
    /// reversed output. The signal is extended at both ends by odd
    /// reflection to keep edge transients out of the result.
    pub fn filtfilt(&self, signal: &[f64], padlen: usize) -> Vec<f64> {
        let n = signal.len();
        if n == 0 {
            return Vec::new();
        }
        let padlen = padlen.min(n - 1);

        let first = signal[0];
        let last = signal[n - 1];
        let mut extended = Vec::with_capacity(n + 2 * padlen);
        extended.extend((1..=padlen).rev().map(|i| 2.0 * first - signal[i]));
        extended.extend_from_slice(signal);
        extended.extend((1..=padlen).map(|i| 2.0 * last - signal[n - 1 - i]));

        let mut forward = self.clone();
        forward.prime(extended[0]);
        forward.process_signal(&mut extended);

        extended.reverse();
        let mut backward = self.clone();
        backward.prime(extended[0]);
        backward.process_signal(&mut extended);
        extended.reverse();

        extended[padlen..padlen + n].to_vec()
    }
}

/// Butterworth filter designer
pub struct ButterworthFilter;

impl ButterworthFilter {
    /// Design a Butterworth lowpass filter
    pub fn lowpass(cutoff: f64, sample_rate: f64, order: usize) -> SosFilter {
        let wn = Self::prewarp(cutoff, sample_rate);
        SosFilter::new(Self::design_lowpass(wn, order))
    }

    /// Prewarp frequency for bilinear transform
    fn prewarp(freq: f64, sample_rate: f64) -> f64 {
        (PI * freq / sample_rate).tan()
    }

    fn design_lowpass(wn: f64, order: usize) -> Vec<BiquadCoeffs> {
        let num_sections = (order + 1) / 2;
        let mut sections = Vec::with_capacity(num_sections);

        for k in 0..num_sections {
            if order % 2 == 1 && k == num_sections - 1 {
                // Real pole: H(s) = wn / (s + wn)
                let k_coeff = wn / (1.0 + wn);
                sections.push(BiquadCoeffs {
                    b0: k_coeff,
                    b1: k_coeff,
                    b2: 0.0,
                    a1: (wn - 1.0) / (wn + 1.0),
                    a2: 0.0,
                });
            } else {
                // Conjugate pole pair: H(s) = wn^2 / (s^2 + alpha*wn*s + wn^2)
                let theta = PI * (2.0 * k as f64 + 1.0) / (2.0 * order as f64);
                let alpha = 2.0 * theta.sin();
                let wn2 = wn * wn;
                let denom = 1.0 + alpha * wn + wn2;

                sections.push(BiquadCoeffs {
                    b0: wn2 / denom,
                    b1: 2.0 * wn2 / denom,
                    b2: wn2 / denom,
                    a1: 2.0 * (wn2 - 1.0) / denom,
                    a2: (1.0 - alpha * wn + wn2) / denom,
                });
            }
        }

        sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rms(signal: &[f64]) -> f64 {
        (signal.iter().map(|x| x * x).sum::<f64>() / signal.len() as f64).sqrt()
    }

    #[test]
    fn test_section_count() {
        assert_eq!(ButterworthFilter::lowpass(0.1, 1.0, 5).num_sections(), 3);
        assert_eq!(ButterworthFilter::lowpass(0.1, 1.0, 4).num_sections(), 2);
    }

    #[test]
    fn test_lowpass_unity_dc_gain() {
        let filter = ButterworthFilter::lowpass(10.0, 100.0, 5);
        for section in &filter.sections {
            assert!((section.coeffs.dc_gain() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_lowpass_is_stable() {
        let filter = ButterworthFilter::lowpass(0.2, 1.0, 6);
        for section in &filter.sections {
            // Poles inside the unit circle: |a2| < 1 and |a1| < 1 + a2
            assert!(section.coeffs.a2.abs() < 1.0);
            assert!(section.coeffs.a1.abs() < 1.0 + section.coeffs.a2);
        }
    }

    #[test]
    fn test_lowpass_filter() {
        let mut filter = ButterworthFilter::lowpass(10.0, 100.0, 2);

        // DC should pass through
        let mut out = 0.0;
        for _ in 0..500 {
            out = filter.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_filtfilt_keeps_constant_signal() {
        let filter = ButterworthFilter::lowpass(0.1, 1.0, 5);
        let signal = vec![3.5; 200];
        let filtered = filter.filtfilt(&signal, 18);
        assert_eq!(filtered.len(), signal.len());
        for value in filtered {
            assert!((value - 3.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_filtfilt_attenuates_high_frequency() {
        let sample_rate = 100.0;
        let filter = ButterworthFilter::lowpass(5.0, sample_rate, 5);

        let slow: Vec<f64> = (0..2000)
            .map(|i| (2.0 * PI * 1.0 * i as f64 / sample_rate).sin())
            .collect();
        let fast: Vec<f64> = (0..2000)
            .map(|i| (2.0 * PI * 30.0 * i as f64 / sample_rate).sin())
            .collect();

        let slow_out = filter.filtfilt(&slow, 18);
        let fast_out = filter.filtfilt(&fast, 18);

        // Compare away from the edges
        let interior = 200..1800;
        assert!(rms(&slow_out[interior.clone()]) > rms(&slow[interior.clone()]) * 0.9);
        assert!(rms(&fast_out[interior.clone()]) < rms(&fast[interior]) * 0.01);
    }

    #[test]
    fn test_filtfilt_short_signals() {
        let filter = ButterworthFilter::lowpass(0.2, 1.0, 5);
        assert!(filter.filtfilt(&[], 18).is_empty());
        let single = filter.filtfilt(&[2.0], 18);
        assert!((single[0] - 2.0).abs() < 1e-9);
    }
}
