use super::BatchBase;

/// Row-major storage of `f32` vectors of a fixed dimension.
///
/// The row dimension of an empty store is fixed by the first push.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayBatch {
    dim: usize,
    capacity: usize,
    buf: Vec<f32>,
}

impl ArrayBatch {
    /// A batch holding a single row.
    pub fn from_row(row: Vec<f32>) -> Self {
        Self {
            dim: row.len(),
            capacity: 1,
            buf: row,
        }
    }

    /// A batch holding `buf.len() / dim` rows.
    pub fn from_vec(buf: Vec<f32>, dim: usize) -> Self {
        let capacity = if dim == 0 { 0 } else { buf.len() / dim };
        Self { dim, capacity, buf }
    }

    /// Dimension of a row, 0 before the first push.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.capacity
    }

    /// The `i`-th row.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.buf[i * self.dim..(i + 1) * self.dim]
    }

    /// The underlying buffer, row after row.
    pub fn as_slice(&self) -> &[f32] {
        &self.buf
    }

    /// Consumes the batch into its underlying buffer.
    pub fn into_vec(self) -> Vec<f32> {
        self.buf
    }
}

impl BatchBase for ArrayBatch {
    fn new(capacity: usize) -> Self {
        Self {
            dim: 0,
            capacity,
            buf: vec![],
        }
    }

    fn push(&mut self, ix: usize, data: Self) {
        if data.buf.is_empty() || self.capacity == 0 {
            return;
        }
        if self.buf.is_empty() {
            self.dim = data.dim;
        }
        debug_assert_eq!(self.dim, data.dim);

        // Rows are allocated on first write, up to `capacity` rows.
        for r in 0..data.rows() {
            let j = (ix + r) % self.capacity;
            if self.buf.len() < (j + 1) * self.dim {
                self.buf.resize((j + 1) * self.dim, 0.0);
            }
            self.buf[j * self.dim..(j + 1) * self.dim].copy_from_slice(data.row(r));
        }
    }

    fn sample(&self, ixs: &[usize]) -> Self {
        let mut buf = Vec::with_capacity(ixs.len() * self.dim);
        for &ix in ixs.iter() {
            buf.extend_from_slice(self.row(ix));
        }
        Self {
            dim: self.dim,
            capacity: ixs.len(),
            buf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_wraps_around() {
        let mut batch = ArrayBatch::new(3);
        batch.push(0, ArrayBatch::from_vec(vec![0., 0., 1., 1.], 2));
        batch.push(2, ArrayBatch::from_vec(vec![2., 2., 3., 3.], 2));

        assert_eq!(batch.dim(), 2);
        assert_eq!(batch.row(0), &[3., 3.]);
        assert_eq!(batch.row(1), &[1., 1.]);
        assert_eq!(batch.row(2), &[2., 2.]);

        let sampled = batch.sample(&[2, 0]);
        assert_eq!(sampled.rows(), 2);
        assert_eq!(sampled.as_slice(), &[2., 2., 3., 3.]);
    }
}
