//! Myers' O(ND) difference algorithm
//!
//! Produces the shortest edit script turning `a` into `b`. Every edit keeps
//! the positions it was found at on both sides, which is what hunk headers
//! are built from.

use derive_new::new;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Equal,
    Delete,
    Insert,
}

/// One step of an edit script
///
/// `a` and `b` are 0-based positions in the two sequences; for an insertion
/// `a` is the number of `a` elements consumed so far, and likewise `b` for a
/// deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit<'d, T> {
    pub kind: EditKind,
    pub a: usize,
    pub b: usize,
    pub value: &'d T,
}

impl<T> Edit<'_, T> {
    pub fn is_equal(&self) -> bool {
        self.kind == EditKind::Equal
    }
}

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct MyersDiff<'d, T> {
    a: &'d [T],
    b: &'d [T],
}

impl<'d, T: Eq> MyersDiff<'d, T> {
    pub fn diff(&self) -> Vec<Edit<'d, T>> {
        // the common prefix and suffix never need the search
        let prefix = self
            .a
            .iter()
            .zip(self.b.iter())
            .take_while(|(x, y)| x == y)
            .count();
        let suffix = self.a[prefix..]
            .iter()
            .rev()
            .zip(self.b[prefix..].iter().rev())
            .take_while(|(x, y)| x == y)
            .count();

        let a_mid = &self.a[prefix..self.a.len() - suffix];
        let b_mid = &self.b[prefix..self.b.len() - suffix];

        let mut edits = Vec::with_capacity(self.a.len().max(self.b.len()));
        for i in 0..prefix {
            edits.push(self.edit(EditKind::Equal, i, i));
        }

        for (kind, x, y) in Self::middle_script(a_mid, b_mid) {
            edits.push(self.edit(kind, prefix + x, prefix + y));
        }

        let a_tail = self.a.len() - suffix;
        let b_tail = self.b.len() - suffix;
        for i in 0..suffix {
            edits.push(self.edit(EditKind::Equal, a_tail + i, b_tail + i));
        }

        edits
    }

    fn edit(&self, kind: EditKind, a: usize, b: usize) -> Edit<'d, T> {
        let value = match kind {
            EditKind::Insert => &self.b[b],
            EditKind::Equal | EditKind::Delete => &self.a[a],
        };
        Edit { kind, a, b, value }
    }

    /// Greedy forward search; one snapshot of the frontier per edit distance
    fn compute_shortest_edit(a: &[T], b: &[T]) -> Vec<Vec<isize>> {
        let (n, m) = (a.len() as isize, b.len() as isize);
        let offset = (n + m) as usize;

        let mut v = vec![0isize; 2 * offset + 2];
        let mut trace = Vec::new();

        for d in 0..=(n + m) {
            trace.push(v.clone());

            for k in (-d..=d).step_by(2) {
                let idx = (offset as isize + k) as usize;

                // came from k+1 (insertion) or k-1 (deletion), whichever got further
                let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                    v[idx + 1]
                } else {
                    v[idx - 1] + 1
                };

                let mut y = x - k;
                while x < n && y < m && a[x as usize] == b[y as usize] {
                    x += 1;
                    y += 1;
                }

                v[idx] = x;

                if x >= n && y >= m {
                    return trace;
                }
            }
        }

        trace
    }

    /// Edit script for slices with no common prefix or suffix
    fn middle_script(a: &[T], b: &[T]) -> Vec<(EditKind, usize, usize)> {
        if a.is_empty() && b.is_empty() {
            return Vec::new();
        }

        let (mut x, mut y) = (a.len() as isize, b.len() as isize);
        let offset = x + y;
        let mut script = Vec::new();

        for (d, v) in Self::compute_shortest_edit(a, b).iter().enumerate().rev() {
            let d = d as isize;
            let k = x - y;

            let came_down =
                k == -d || (k != d && v[(offset + k - 1) as usize] < v[(offset + k + 1) as usize]);
            let prev_k = if came_down {
                k + 1
            } else {
                k - 1
            };

            let prev_x = v[(offset + prev_k) as usize];
            let prev_y = prev_x - prev_k;

            while x > prev_x && y > prev_y {
                script.push((EditKind::Equal, (x - 1) as usize, (y - 1) as usize));
                x -= 1;
                y -= 1;
            }

            if d > 0 {
                if x == prev_x {
                    script.push((EditKind::Insert, prev_x as usize, prev_y as usize));
                } else {
                    script.push((EditKind::Delete, prev_x as usize, prev_y as usize));
                }
            }

            (x, y) = (prev_x, prev_y);
        }

        script.reverse();
        script
    }
}
