/// Visit every index tuple of a mixed-radix counter, in lexicographic order.
///
/// ```text
/// radices = [2, 3]  ->  [0,0] [0,1] [0,2] [1,0] [1,1] [1,2]
/// ```
///
/// An empty `radices` yields exactly one (empty) tuple; any zero radix
/// yields none.
pub fn for_each_tuple<F>(radices: &[usize], mut f: F)
where
    F: FnMut(&[usize]),
{
    if radices.contains(&0) {
        return;
    }
    let mut current = vec![0; radices.len()];
    loop {
        f(&current);
        // Increment the odometer, rightmost digit first.
        let mut pos = radices.len();
        loop {
            if pos == 0 {
                return;
            }
            pos -= 1;
            current[pos] += 1;
            if current[pos] < radices[pos] {
                break;
            }
            current[pos] = 0;
        }
    }
}
