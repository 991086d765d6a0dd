use ethers::contract::abigen;

// Read surface of the ecosystem tax tokens. Plain ERC20s answer the first five
// and revert (or are missing) on the rest.
abigen!(
    TaxToken,
    r#"[
        function name() external view returns (string)
        function symbol() external view returns (string)
        function decimals() external view returns (uint8)
        function totalSupply() external view returns (uint256)
        function balanceOf(address account) external view returns (uint256)
        function distributor() external view returns (address)
        function liquidityFee() external view returns (uint256)
        function reflectionFee() external view returns (uint256)
        function devFee() external view returns (uint256)
        function marketingFee() external view returns (uint256)
        function totalFee() external view returns (uint256)
        function sellMultiplier() external view returns (uint256)
        event Transfer(address indexed from, address indexed to, uint256 value)
    ]"#,
);
