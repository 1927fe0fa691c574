// Copyright 2020 LEXUGE
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use criterion::{criterion_group, criterion_main, Criterion};
use upstream_list::{ParseMode, Rotation, UpstreamList};

fn bench_hashed_get(c: &mut Criterion) {
    let list = UpstreamList::new(None);
    for i in 0..32 {
        list.add_upstream(&format!("10.0.{}.1:80", i), 80, ParseMode::Default, None)
            .unwrap();
    }
    let keys: Vec<String> = (0..1000).map(|i| format!("session-{}", i)).collect();
    c.bench_function("hashed get over 32 upstreams", |b| {
        b.iter(|| {
            for key in &keys {
                list.get(Rotation::Hashed, Some(key.as_bytes()));
            }
        })
    });
}

fn bench_round_robin_get(c: &mut Criterion) {
    let list = UpstreamList::new(None);
    for i in 0..32 {
        list.add_upstream(&format!("10.0.{}.1:80:{}", i, i % 4 + 1), 80, ParseMode::Default, None)
            .unwrap();
    }
    c.bench_function("round-robin get over 32 upstreams", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                list.get(Rotation::RoundRobin, None);
            }
        })
    });
}

criterion_group!(benches, bench_hashed_get, bench_round_robin_get);
criterion_main!(benches);
