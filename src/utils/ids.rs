macro_rules! id_gen {
    ($name:ident) => {
        mod $name {
            use std::collections::HashSet;
            use std::sync::Mutex;

            lazy_static::lazy_static! {
                static ref IDS: Mutex<(usize, HashSet<usize>)> =
                    Mutex::new((0, HashSet::new()));
            }

            pub(crate) fn next() -> usize {
                let mut guard = IDS.lock().unwrap();
                let (counter, live) = &mut *guard;
                if live.len() == usize::MAX {
                    panic!("Out of ids");
                }

                while !live.insert(*counter) {
                    *counter = counter.wrapping_add(1);
                }

                let id = *counter;
                *counter = counter.wrapping_add(1);
                id
            }

            pub(crate) fn remove(id: usize) {
                IDS.lock().unwrap().1.remove(&id);
            }
        }
    };
}

pub(crate) use id_gen;
