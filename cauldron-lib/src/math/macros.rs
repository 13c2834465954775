#[macro_export]
macro_rules! define_fixed_point {
    (
        $name:ident,        // e.g. IFixedPoint
        $fixed:ty,          // e.g. I80F48
        $inner:ty           // e.g. i128
    ) => {
        #[repr(transparent)]
        #[derive(
            Clone,
            Copy,
            Default,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            borsh::BorshSerialize,
            borsh::BorshDeserialize,
        )]
        pub struct $name($fixed);

        impl $name {
            pub const MAX: Self = $name(<$fixed>::MAX);
            pub const MIN: Self = $name(<$fixed>::MIN);
            pub const FRAC_NBITS: u32 = <$fixed>::FRAC_NBITS;

            pub const fn bits(self) -> $inner {
                self.0.to_bits()
            }

            pub const fn lit(str: &str) -> Self {
                $name(<$fixed>::lit(str))
            }

            pub const fn from_u64(num: u64) -> Self {
                $name(<$fixed>::from_bits((num as $inner) << Self::FRAC_NBITS))
            }

            pub const fn from_bits(bits: $inner) -> Self {
                $name(<$fixed>::from_bits(bits))
            }

            pub const fn from_fixed(num: $fixed) -> Self {
                $name(num)
            }

            pub const fn to_fixed(self) -> $fixed {
                self.0
            }

            pub fn from_num<N: fixed::traits::ToFixed>(num: N) -> Self {
                $name(<$fixed>::from_num(num))
            }

            pub fn from_num_checked<N: fixed::traits::ToFixed>(num: N) -> Option<Self> {
                Some($name(num.checked_to_fixed()?))
            }

            pub const fn zero() -> Self {
                Self::from_u64(0)
            }

            pub const fn one() -> Self {
                Self::from_u64(1)
            }

            pub const fn is_zero(self) -> bool {
                self.0.to_bits() == 0
            }

            pub fn to_float(&self) -> f64 {
                self.0.to_num()
            }

            #[track_caller]
            pub fn checked_to_num<N: fixed::traits::FromFixed>(
                self,
            ) -> $crate::error::LendingResult<N> {
                self.0
                    .checked_to_num()
                    .ok_or_else($crate::with_context!(
                        $crate::error::LendingError::CastOverflow
                    ))
            }

            #[track_caller]
            pub fn as_u64_rounded_down(self) -> $crate::error::LendingResult<u64> {
                self.checked_to_num::<u64>()
            }

            #[track_caller]
            pub fn as_u64_rounded_up(self) -> $crate::error::LendingResult<u64> {
                let rounded_down = self.checked_to_num::<u64>()?;
                if self.0.frac() == 0 {
                    Ok(rounded_down)
                } else {
                    rounded_down.checked_add(1).ok_or_else($crate::with_context!(
                        $crate::error::LendingError::CastOverflow
                    ))
                }
            }

            #[track_caller]
            pub fn as_u64_rounded(
                self,
                rounding: $crate::math::rounding::RoundingMode,
            ) -> $crate::error::LendingResult<u64> {
                match rounding {
                    $crate::math::rounding::RoundingMode::RoundDown => self.as_u64_rounded_down(),
                    $crate::math::rounding::RoundingMode::RoundUp => self.as_u64_rounded_up(),
                }
            }

            #[track_caller]
            pub fn from_ratio<N: fixed::traits::ToFixed, M: fixed::traits::ToFixed>(
                num: N,
                dem: M,
            ) -> $crate::error::LendingResult<Self> {
                use $crate::math::safe_math::SafeMath;
                Self::from_num(num)
                    .safe_div(Self::from_num(dem))
                    .map_err($crate::map_context!(
                        $crate::error::LendingError::DivisionOverflow
                    ))
            }
        }

        impl<N: fixed::traits::ToFixed> From<N> for $name {
            fn from(num: N) -> Self {
                Self::from_num(num)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = fixed::ParseFixedError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$fixed as std::str::FromStr>::from_str(s).map($name)
            }
        }

        impl $crate::math::safe_math::SafeMath for $name {
            fn safe_add(self, other: Self) -> $crate::error::LendingResult<Self> {
                self.0
                    .checked_add(other.0)
                    .map($name)
                    .ok_or_else($crate::with_context!(
                        $crate::error::LendingError::AdditionOverflow
                    ))
            }

            fn safe_sub(self, other: Self) -> $crate::error::LendingResult<Self> {
                self.0
                    .checked_sub(other.0)
                    .map($name)
                    .ok_or_else($crate::with_context!(
                        $crate::error::LendingError::SubtractionOverflow
                    ))
            }

            fn safe_mul(self, other: Self) -> $crate::error::LendingResult<Self> {
                self.0
                    .checked_mul(other.0)
                    .map($name)
                    .ok_or_else($crate::with_context!(
                        $crate::error::LendingError::MultiplicationOverflow
                    ))
            }

            #[track_caller]
            fn safe_div(self, other: Self) -> $crate::error::LendingResult<Self> {
                self.0
                    .checked_div(other.0)
                    .map($name)
                    .ok_or_else($crate::with_context!(
                        $crate::error::LendingError::DivisionOverflow
                    ))
            }
        }

        impl $crate::math::safe_math::SafeMath<u64, Self> for $name {
            fn safe_add(self, other: u64) -> $crate::error::LendingResult<Self> {
                <$fixed>::checked_from_num(other)
                    .and_then(|other| self.0.checked_add(other))
                    .map($name)
                    .ok_or_else($crate::with_context!(
                        $crate::error::LendingError::AdditionOverflow
                    ))
            }

            fn safe_sub(self, other: u64) -> $crate::error::LendingResult<Self> {
                <$fixed>::checked_from_num(other)
                    .and_then(|other| self.0.checked_sub(other))
                    .map($name)
                    .ok_or_else($crate::with_context!(
                        $crate::error::LendingError::SubtractionOverflow
                    ))
            }

            fn safe_mul(self, other: u64) -> $crate::error::LendingResult<Self> {
                self.0
                    .to_bits()
                    .checked_mul(other as $inner)
                    .map($name::from_bits)
                    .ok_or_else($crate::with_context!(
                        $crate::error::LendingError::MultiplicationOverflow
                    ))
            }

            fn safe_div(self, other: u64) -> $crate::error::LendingResult<Self> {
                self.0
                    .to_bits()
                    .checked_div(other as $inner)
                    .map($name::from_bits)
                    .ok_or_else($crate::with_context!(
                        $crate::error::LendingError::DivisionByZero
                    ))
            }
        }

        #[cfg(feature = "client")]
        pub mod serde {
            use super::*;

            impl ::serde::Serialize for $name {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: ::serde::Serializer,
                {
                    serializer.serialize_str(&self.0.to_string())
                }
            }

            impl<'a> ::serde::de::Deserialize<'a> for $name {
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: ::serde::Deserializer<'a>,
                {
                    let s: String = ::serde::de::Deserialize::deserialize(deserializer)?;
                    s.parse().map_err(::serde::de::Error::custom)
                }
            }
        }
    };
}
