//! Shared test schema: five components, three tags, four signatures.

#![allow(dead_code)]

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(transparent)]
pub struct C0(pub u32);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(transparent)]
pub struct C1(pub u32);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct C2(pub u64);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct C3(pub i32);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct C4(pub i64);

pub struct T0;
pub struct T1;
pub struct T2;

crate::schema! {
    pub struct Demo {
        components { c0: C0, c1: C1, c2: C2, c3: C3, c4: C4 }
        tags { T0, T1, T2 }
        signatures {
            S0 = [] + [];
            S1 = [C0, C1] + [];
            S2 = [C0, C4] + [T0];
            S3 = [C1, C3] + [T0, T2];
        }
        systems {}
    }
}
