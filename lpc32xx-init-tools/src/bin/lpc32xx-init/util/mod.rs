pub mod logging;

use std::num::ParseIntError;

pub fn parse_u32(input: &str) -> Result<u32, ParseIntError> {
    parse_int::parse(input)
}

#[cfg(test)]
mod test {
    use test_case::test_case;

    use super::parse_u32;

    #[test_case("0x31080200" => 0x3108_0200)]
    #[test_case("256" => 256)]
    #[test_case("0b101" => 5)]
    fn numbers_in_any_base(input: &str) -> u32 {
        parse_u32(input).unwrap()
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_u32("DDR").is_err());
    }
}
