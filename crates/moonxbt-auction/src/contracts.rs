//! Solidity bindings for the contracts the client talks to.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IMoonAuction {
        function currentAuctionId() external view returns (uint256);
        function getTimeRemaining() external view returns (uint256);
        function getBid(uint256 auctionId) external view returns (address bidder, uint256 amount, string resourceValue);
        function getLastAuctionWinner() external view returns (address winner, uint256 amount, string resourceValue);
        function placeBid(uint256 amount, string calldata resourceValue) external;
    }
}

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }
}
