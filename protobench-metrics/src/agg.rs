/// Arithmetic mean by plain summation.
///
/// Accumulation order affects the last bits of the result; callers that
/// compare means should use a tolerance.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MeanAccumulator {
    n: u64,
    sum: f64,
}

impl MeanAccumulator {
    pub fn push(&mut self, x: f64) {
        self.n = self.n.saturating_add(1);
        self.sum += x;
    }

    pub fn count(&self) -> u64 {
        self.n
    }

    /// `None` until at least one value was pushed.
    pub fn mean(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }
}

impl Extend<f64> for MeanAccumulator {
    fn extend<T: IntoIterator<Item = f64>>(&mut self, iter: T) {
        for x in iter {
            self.push(x);
        }
    }
}

impl FromIterator<f64> for MeanAccumulator {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        let mut acc = Self::default();
        acc.extend(iter);
        acc
    }
}

#[inline]
pub fn per_sec(total: f64, dt_secs: f64) -> f64 {
    // `dt_secs` should always be > 0 here, but clamp to avoid division-by-zero.
    let dt = dt_secs.max(1e-9);
    total / dt
}
