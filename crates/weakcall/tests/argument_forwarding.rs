//! Arguments reach the bound method unchanged, including move-only ones.

use std::cell::RefCell;
use std::rc::Rc;
use weakcall::{make_weak_callback, make_weak_callback_mut};

#[derive(Default)]
struct Recorder {
    seen: RefCell<Vec<(i32, String)>>,
}

impl Recorder {
    fn record(&self, n: i32, s: &str) {
        self.seen.borrow_mut().push((n, s.to_string()));
    }
}

/// Neither `Clone` nor `Copy`.
#[derive(Debug, PartialEq, Eq)]
struct Ticket {
    id: u64,
    payload: Vec<u8>,
}

#[derive(Default)]
struct Vault {
    tickets: Vec<Ticket>,
}

impl Vault {
    fn store(&mut self, ticket: Ticket) {
        self.tickets.push(ticket);
    }

    fn store_batch(&mut self, first: Ticket, rest: Vec<Ticket>) -> usize {
        self.tickets.push(first);
        self.tickets.extend(rest);
        self.tickets.len()
    }
}

fn ticket(id: u64, payload: &[u8]) -> Ticket {
    Ticket {
        id,
        payload: payload.to_vec(),
    }
}

#[test]
fn values_arrive_unmodified() {
    let rec = Rc::new(Recorder::default());
    let cb = make_weak_callback(&rec, Recorder::record);
    cb.call((5, "x"));
    assert_eq!(*rec.seen.borrow(), vec![(5, "x".to_string())]);
}

#[test]
fn borrowed_arguments_keep_identity() {
    let buf = String::from("shared");
    let seen_ptr = Rc::new(RefCell::new(None));
    let target = Rc::new(());
    let sink = Rc::clone(&seen_ptr);
    let cb = make_weak_callback(&target, move |_: &(), s: &String| {
        *sink.borrow_mut() = Some(s as *const String);
    });
    cb.call((&buf,));
    assert_eq!(*seen_ptr.borrow(), Some(&buf as *const String));
}

#[test]
fn move_only_arguments_are_forwarded() {
    let vault = Rc::new(RefCell::new(Vault::default()));
    let cb = make_weak_callback_mut(&vault, Vault::store);
    cb.call((ticket(1, &[1, 2, 3]),));
    assert_eq!(vault.borrow().tickets, vec![ticket(1, &[1, 2, 3])]);
}

#[test]
fn several_move_only_arguments_and_output() {
    let vault = Rc::new(RefCell::new(Vault::default()));
    let cb = make_weak_callback_mut(&vault, Vault::store_batch);
    let n = cb
        .try_call((ticket(1, &[]), vec![ticket(2, &[9]), ticket(3, &[])]))
        .expect("vault alive");
    assert_eq!(n, 3);
    assert_eq!(vault.borrow().tickets[1], ticket(2, &[9]));
}

#[test]
fn dead_target_drops_arguments_without_calling() {
    let bin = Rc::new(RefCell::new(Vec::<Rc<()>>::new()));
    let cb = make_weak_callback_mut(&bin, |v: &mut Vec<Rc<()>>, p: Rc<()>| v.push(p));
    drop(bin);

    let payload = Rc::new(());
    cb.call((Rc::clone(&payload),));
    assert_eq!(Rc::strong_count(&payload), 1);
    assert!(cb.is_expired());
}
